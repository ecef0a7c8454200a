//! Report formatting for the CLI.
//!
//! Human output is a per-operation statistics table followed by a failure
//! table when anything failed. JSON output bundles the run summary and the
//! full report for scripting.

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Color, ContentArrangement, Table};
use loadgen_core::{RunSummary, StatsReport};
use serde::Serialize;
use std::fmt::Display;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables
    Human,
    /// JSON output for scripting
    Json,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Human }
    }
}

/// Print a success message
pub fn success(msg: impl Display) {
    println!("✓ {}", msg);
}

/// Print an error message
pub fn error(msg: impl Display) {
    eprintln!("✗ {}", msg);
}

#[derive(Serialize)]
struct RunOutput<'a> {
    summary: &'a RunSummary,
    report: &'a StatsReport,
}

/// Render a finished run in the requested format.
pub fn render_run(summary: &RunSummary, report: &StatsReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&RunOutput { summary, report })?),
        OutputFormat::Human => {
            let mut out = format!(
                "Users: {} started, {} failed to start | Tasks: {} | Elapsed: {:.1}s\n\n{}",
                summary.users_started,
                summary.startup_failures,
                summary.tasks_run,
                summary.elapsed_ms as f64 / 1000.0,
                stats_table(report),
            );

            if report.total_failures() > 0 {
                out.push_str("\n\nFailures\n");
                out.push_str(&failures_table(report).to_string());
            }
            Ok(out)
        }
    }
}

pub fn print_run(summary: &RunSummary, report: &StatsReport, format: OutputFormat) -> Result<()> {
    println!("{}", render_run(summary, report, format)?);
    Ok(())
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)));
    table
}

fn right(value: impl Display) -> Cell {
    Cell::new(value).set_alignment(CellAlignment::Right)
}

/// Per-operation statistics, one row per `(type, name)` plus a total row.
pub fn stats_table(report: &StatsReport) -> Table {
    let mut table = new_table(&[
        "Type", "Name", "# reqs", "# fails", "Avg", "Min", "Max", "Med", "95%ile", "99%ile",
    ]);

    for op in &report.operations {
        table.add_row(vec![
            Cell::new(&op.request_type),
            Cell::new(&op.name),
            right(op.num_requests),
            right(format!("{} ({:.1}%)", op.num_failures, op.failure_ratio() * 100.0)),
            right(format!("{:.0}", op.avg_response_time)),
            right(op.min_response_time),
            right(op.max_response_time),
            right(op.median_response_time),
            right(op.p95_response_time),
            right(op.p99_response_time),
        ]);
    }

    table.add_row(vec![
        Cell::new(""),
        Cell::new("Aggregated"),
        right(report.total_requests()),
        right(report.total_failures()),
    ]);
    table
}

/// Failure causes with their occurrence counts.
pub fn failures_table(report: &StatsReport) -> Table {
    let mut table = new_table(&["# occurrences", "Type", "Name", "Error"]);

    for op in &report.operations {
        for (cause, count) in &op.failures {
            table.add_row(vec![
                right(count),
                Cell::new(&op.request_type),
                Cell::new(&op.name),
                Cell::new(cause),
            ]);
        }
    }
    table
}
