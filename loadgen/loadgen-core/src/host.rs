//! Capabilities a scenario user provides to the runner.
//!
//! A scenario user implements [`VirtualUser`]: startup and teardown hooks, a
//! weighted task list and a wait time between tasks. The runner owns
//! scheduling; users never see each other.

use crate::error::Result;
use crate::events::EventSink;
use async_trait::async_trait;
use futures::future::BoxFuture;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Task body: borrows the user for the duration of one run.
pub type TaskFn<U> = for<'a> fn(&'a mut U) -> BoxFuture<'a, ()>;

/// A named, weighted scenario task.
pub struct Task<U> {
    pub name: &'static str,
    pub weight: u32,
    pub run: TaskFn<U>,
}

impl<U> Task<U> {
    pub fn new(name: &'static str, weight: u32, run: TaskFn<U>) -> Self {
        Self { name, weight, run }
    }
}

impl<U> Clone for Task<U> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            weight: self.weight,
            run: self.run,
        }
    }
}

impl<U> fmt::Debug for Task<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .finish()
    }
}

/// Pause between two tasks of one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTime {
    Constant(Duration),
    /// Uniformly random in `[min, max]`
    Between(Duration, Duration),
}

impl WaitTime {
    pub fn constant(wait: Duration) -> Self {
        Self::Constant(wait)
    }

    pub fn between(min: Duration, max: Duration) -> Self {
        if min >= max {
            Self::Constant(min)
        } else {
            Self::Between(min, max)
        }
    }

    pub fn sample(&self) -> Duration {
        match *self {
            Self::Constant(wait) => wait,
            Self::Between(min, max) => {
                let millis = rand::rng().random_range(min.as_millis()..=max.as_millis());
                Duration::from_millis(millis as u64)
            }
        }
    }
}

impl Default for WaitTime {
    fn default() -> Self {
        Self::Constant(Duration::ZERO)
    }
}

/// What the runner hands each user at construction.
#[derive(Clone)]
pub struct UserContext {
    /// Index of this user within the run
    pub user_id: usize,
    /// Target endpoint chosen for the run, if any
    pub host: Option<String>,
    pub events: Arc<dyn EventSink>,
}

impl fmt::Debug for UserContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserContext")
            .field("user_id", &self.user_id)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

/// A simulated client driven by the runner.
#[async_trait]
pub trait VirtualUser: Send + 'static {
    /// Called once before the first task.
    async fn on_start(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called once after the last task.
    async fn on_stop(&mut self) {}

    fn tasks(&self) -> Vec<Task<Self>>
    where
        Self: Sized;

    fn wait_time(&self) -> WaitTime {
        WaitTime::default()
    }
}

/// Pick a task with probability proportional to its weight.
///
/// Returns `None` when no task has a positive weight.
pub fn pick_weighted<U>(tasks: &[Task<U>]) -> Option<&Task<U>> {
    let total: u64 = tasks.iter().map(|t| t.weight as u64).sum();
    if total == 0 {
        return None;
    }

    let mut roll = rand::rng().random_range(0..total);
    for task in tasks {
        let weight = task.weight as u64;
        if roll < weight {
            return Some(task);
        }
        roll -= weight;
    }
    None
}
