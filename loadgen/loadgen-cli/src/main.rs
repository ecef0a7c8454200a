//! Loadgen CLI - drive a Qdrant load test from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Ten users for a minute against a local instance
//! loadgen run --host http://localhost:6334 --users 10 --run-time 60
//!
//! # Machine-readable report
//! loadgen run --json
//!
//! # Write a starting configuration file
//! loadgen init-config loadgen.toml
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use loadgen_cli::{commands, output, OutputFormat, RunOptions};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "loadgen")]
#[command(about = "Loadgen - load testing for Qdrant", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bundled Qdrant scenario
    Run {
        /// Qdrant endpoint every user connects to
        #[arg(long)]
        host: Option<String>,

        /// Number of concurrent users
        #[arg(short, long)]
        users: Option<usize>,

        /// Run time in seconds
        #[arg(short, long)]
        run_time: Option<u64>,

        /// Target collection
        #[arg(long)]
        collection: Option<String>,

        /// Vector dimensionality of the provisioned collection
        #[arg(long)]
        dimension: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a configuration file with the scenario defaults
    InitConfig {
        /// Destination path
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::error(format!("{:#}", e));
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            host,
            users,
            run_time,
            collection,
            dimension,
            json,
        } => {
            let options = RunOptions {
                host,
                users,
                run_time_secs: run_time,
                collection,
                dimension,
            };
            commands::run_scenario(cli.config.as_deref(), options, OutputFormat::from_flag(json)).await?;
        }

        Commands::InitConfig { path, force } => {
            commands::init_config(&path, force).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("loadgen_core=debug,loadgen_cli=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("loadgen_core=info,loadgen_cli=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
