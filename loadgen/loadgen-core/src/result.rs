//! Uniform record returned by every client operation.

use crate::error::OperationError;
use qdrant_client::qdrant::{PointId, RetrievedPoint};
use std::sync::Arc;
use std::time::Instant;

/// How an operation ended.
#[derive(Debug)]
pub enum Outcome<T> {
    /// The call returned; for search and scroll, at least one point matched
    Success(T),
    /// The call returned without error but matched nothing
    Empty(T),
    /// The call failed
    Failure(Arc<OperationError>),
}

/// Timed result of one remote call.
///
/// `success()` is false whenever the call failed, or when a search or scroll
/// returned zero matches.
#[derive(Debug)]
pub struct OperationResult<T> {
    response_time: f64,
    outcome: Outcome<T>,
}

impl<T> OperationResult<T> {
    pub fn new(response_time: f64, outcome: Outcome<T>) -> Self {
        Self {
            response_time,
            outcome,
        }
    }

    /// Build a result with the time elapsed since `start`.
    pub(crate) fn since(start: Instant, outcome: Outcome<T>) -> Self {
        Self::new(elapsed_ms(start), outcome)
    }

    pub fn success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    /// True when the call completed but matched nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self.outcome, Outcome::Empty(_))
    }

    /// Elapsed wall-clock time in milliseconds.
    pub fn response_time(&self) -> f64 {
        self.response_time
    }

    /// Response payload, present unless the call failed.
    pub fn result(&self) -> Option<&T> {
        match &self.outcome {
            Outcome::Success(value) | Outcome::Empty(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Arc<OperationError>> {
        match &self.outcome {
            Outcome::Failure(err) => Some(err),
            _ => None,
        }
    }

    pub fn outcome(&self) -> &Outcome<T> {
        &self.outcome
    }

    pub fn into_outcome(self) -> Outcome<T> {
        self.outcome
    }
}

/// One page of a scroll.
#[derive(Debug, Clone, Default)]
pub struct ScrollPage {
    pub points: Vec<RetrievedPoint>,
    /// Offset to pass to the next scroll; `None` once the collection is exhausted
    pub next_offset: Option<PointId>,
}

/// Result of collection provisioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    Created,
    AlreadyExists,
}

pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
