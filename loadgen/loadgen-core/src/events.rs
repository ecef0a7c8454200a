//! Request events consumed by the statistics pipeline.

use crate::error::OperationError;
use crate::result::OperationResult;
use parking_lot::Mutex;
use std::sync::Arc;

/// Request type tag carried by every Qdrant event.
pub const CLIENT_TYPE: &str = "qdrant";

/// One finished request, successful or not.
#[derive(Debug, Clone)]
pub struct RequestEvent {
    pub request_type: String,
    pub name: String,
    /// Elapsed time in whole milliseconds
    pub response_time: u64,
    /// Payload size; always 0, responses are not measured
    pub response_length: u64,
    pub exception: Option<Arc<OperationError>>,
}

impl RequestEvent {
    /// Derive an event from an operation result.
    ///
    /// The float response time is truncated, not rounded.
    pub fn from_result<T>(request_type: &str, name: &str, result: &OperationResult<T>) -> Self {
        Self {
            request_type: request_type.to_string(),
            name: name.to_string(),
            response_time: result.response_time() as u64,
            response_length: 0,
            exception: result.failure().cloned(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.exception.is_some()
    }
}

/// Receiver of request events.
pub trait EventSink: Send + Sync {
    fn fire(&self, event: RequestEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn fire(&self, _event: RequestEvent) {}
}

/// Sink that keeps every event in memory, in firing order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<RequestEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RequestEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for RecordingSink {
    fn fire(&self, event: RequestEvent) {
        self.events.lock().push(event);
    }
}
