//! Per-operation latency and failure statistics.

use crate::events::{EventSink, RequestEvent};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct Entry {
    num_requests: u64,
    num_failures: u64,
    total_response_time: u64,
    min_response_time: Option<u64>,
    max_response_time: u64,
    /// Request count per rounded response time
    response_times: BTreeMap<u64, u64>,
    failures: BTreeMap<String, u64>,
}

impl Entry {
    fn record(&mut self, event: &RequestEvent) {
        let time = event.response_time;
        self.num_requests += 1;
        self.total_response_time += time;
        self.min_response_time = Some(self.min_response_time.map_or(time, |min| min.min(time)));
        self.max_response_time = self.max_response_time.max(time);
        *self.response_times.entry(round_response_time(time)).or_default() += 1;

        if let Some(cause) = &event.exception {
            self.num_failures += 1;
            *self.failures.entry(cause.to_string()).or_default() += 1;
        }
    }

    fn snapshot(&self, request_type: &str, name: &str) -> OperationStats {
        OperationStats {
            request_type: request_type.to_string(),
            name: name.to_string(),
            num_requests: self.num_requests,
            num_failures: self.num_failures,
            avg_response_time: if self.num_requests == 0 {
                0.0
            } else {
                self.total_response_time as f64 / self.num_requests as f64
            },
            min_response_time: self.min_response_time.unwrap_or(0),
            max_response_time: self.max_response_time,
            median_response_time: percentile(&self.response_times, self.num_requests, 0.50),
            p95_response_time: percentile(&self.response_times, self.num_requests, 0.95),
            p99_response_time: percentile(&self.response_times, self.num_requests, 0.99),
            failures: self.failures.clone(),
        }
    }
}

/// Aggregated numbers for one `(request_type, name)` pair. Times in ms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationStats {
    pub request_type: String,
    pub name: String,
    pub num_requests: u64,
    pub num_failures: u64,
    pub avg_response_time: f64,
    pub min_response_time: u64,
    pub max_response_time: u64,
    pub median_response_time: u64,
    pub p95_response_time: u64,
    pub p99_response_time: u64,
    /// Failure causes and how often each was seen
    pub failures: BTreeMap<String, u64>,
}

impl OperationStats {
    pub fn failure_ratio(&self) -> f64 {
        if self.num_requests == 0 {
            0.0
        } else {
            self.num_failures as f64 / self.num_requests as f64
        }
    }
}

/// Snapshot of every operation seen so far, sorted by type then name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsReport {
    pub operations: Vec<OperationStats>,
}

impl StatsReport {
    pub fn get(&self, request_type: &str, name: &str) -> Option<&OperationStats> {
        self.operations
            .iter()
            .find(|s| s.request_type == request_type && s.name == name)
    }

    pub fn total_requests(&self) -> u64 {
        self.operations.iter().map(|s| s.num_requests).sum()
    }

    pub fn total_failures(&self) -> u64 {
        self.operations.iter().map(|s| s.num_failures).sum()
    }
}

/// [`EventSink`] that aggregates events as they are fired.
#[derive(Debug, Default)]
pub struct StatsCollector {
    entries: Mutex<BTreeMap<(String, String), Entry>>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self) -> StatsReport {
        let entries = self.entries.lock();
        StatsReport {
            operations: entries
                .iter()
                .map(|((request_type, name), entry)| entry.snapshot(request_type, name))
                .collect(),
        }
    }

    pub fn reset(&self) {
        self.entries.lock().clear();
    }
}

impl EventSink for StatsCollector {
    fn fire(&self, event: RequestEvent) {
        let key = (event.request_type.clone(), event.name.clone());
        self.entries.lock().entry(key).or_default().record(&event);
    }
}

/// Bucket a response time: exact below 100ms, then two significant digits
/// up to 10s and three above.
fn round_response_time(millis: u64) -> u64 {
    let step = match millis {
        0..100 => 1,
        100..1_000 => 10,
        1_000..10_000 => 100,
        _ => 1_000,
    };
    (millis + step / 2) / step * step
}

/// Nearest-rank percentile over bucketed counts.
fn percentile(buckets: &BTreeMap<u64, u64>, total: u64, quantile: f64) -> u64 {
    if total == 0 {
        return 0;
    }
    let rank = ((quantile * total as f64).ceil() as u64).clamp(1, total);

    let mut seen = 0;
    for (&time, &count) in buckets {
        seen += count;
        if seen >= rank {
            return time;
        }
    }
    buckets.keys().next_back().copied().unwrap_or(0)
}
