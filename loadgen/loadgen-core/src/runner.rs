//! Drives virtual users concurrently for a fixed run time.
//!
//! Each user runs on its own tokio task: build, `on_start`, then weighted
//! tasks separated by the user's wait time until the run time is over, then
//! `on_stop`. A task already in flight when time runs out finishes normally.

use crate::error::Result;
use crate::events::EventSink;
use crate::host::{pick_weighted, UserContext, VirtualUser};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Shape of one run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub users: usize,
    pub run_time: Duration,
    /// Endpoint handed to every user through [`UserContext::host`]
    pub host: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            users: 1,
            run_time: Duration::from_secs(30),
            host: None,
        }
    }
}

/// Totals for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub users_started: usize,
    pub startup_failures: usize,
    pub tasks_run: u64,
    pub elapsed_ms: u64,
}

enum UserExit {
    Finished { tasks_run: u64 },
    StartupFailed,
}

pub struct Runner {
    config: RunnerConfig,
    events: Arc<dyn EventSink>,
}

impl Runner {
    pub fn new(config: RunnerConfig, events: Arc<dyn EventSink>) -> Self {
        Self { config, events }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run `config.users` users built by `factory` until the run time elapses.
    pub async fn run<U, F, Fut>(&self, factory: F) -> RunSummary
    where
        U: VirtualUser,
        F: Fn(UserContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<U>> + Send + 'static,
    {
        let started = Instant::now();
        let token = CancellationToken::new();

        info!(
            "Starting run: {} users for {:?}",
            self.config.users, self.config.run_time
        );

        let mut users = JoinSet::new();
        for user_id in 0..self.config.users {
            let ctx = UserContext {
                user_id,
                host: self.config.host.clone(),
                events: self.events.clone(),
            };
            let build = factory(ctx);
            let token = token.clone();
            users.spawn(run_user(user_id, build, token));
        }

        let timer = {
            let token = token.clone();
            let run_time = self.config.run_time;
            tokio::spawn(async move {
                tokio::time::sleep(run_time).await;
                token.cancel();
            })
        };

        let mut summary = RunSummary::default();
        while let Some(joined) = users.join_next().await {
            match joined {
                Ok(UserExit::Finished { tasks_run }) => {
                    summary.users_started += 1;
                    summary.tasks_run += tasks_run;
                }
                Ok(UserExit::StartupFailed) => summary.startup_failures += 1,
                Err(e) => {
                    warn!("User task failed: {}", e);
                    summary.startup_failures += 1;
                }
            }
        }

        timer.abort();
        summary.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            "Run finished: {} users, {} startup failures, {} tasks in {}ms",
            summary.users_started, summary.startup_failures, summary.tasks_run, summary.elapsed_ms
        );
        summary
    }
}

async fn run_user<U, Fut>(user_id: usize, build: Fut, token: CancellationToken) -> UserExit
where
    U: VirtualUser,
    Fut: Future<Output = Result<U>>,
{
    let mut user = match build.await {
        Ok(user) => user,
        Err(e) => {
            warn!("User {} failed to start: {}", user_id, e);
            return UserExit::StartupFailed;
        }
    };

    if let Err(e) = user.on_start().await {
        warn!("User {} on_start failed: {}", user_id, e);
        user.on_stop().await;
        return UserExit::StartupFailed;
    }

    let tasks = user.tasks();
    let mut tasks_run = 0;

    while !token.is_cancelled() {
        let Some(task) = pick_weighted(&tasks) else {
            warn!("User {} has no runnable tasks", user_id);
            break;
        };
        let run = task.run;
        debug!("User {} running task '{}'", user_id, task.name);

        run(&mut user).await;
        tasks_run += 1;

        let wait = user.wait_time().sample();
        if wait.is_zero() {
            tokio::task::yield_now().await;
            continue;
        }
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }
    }

    user.on_stop().await;
    UserExit::Finished { tasks_run }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadgenError;
    use crate::events::NoopSink;
    use crate::host::{Task, WaitTime};
    use async_trait::async_trait;
    use futures::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counters {
        starts: AtomicUsize,
        stops: AtomicUsize,
        ticks: AtomicUsize,
    }

    struct CountingUser {
        counters: Arc<Counters>,
        fail_start: bool,
    }

    fn tick(user: &mut CountingUser) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            user.counters.ticks.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[async_trait]
    impl VirtualUser for CountingUser {
        async fn on_start(&mut self) -> Result<()> {
            self.counters.starts.fetch_add(1, Ordering::SeqCst);
            if self.fail_start {
                return Err(LoadgenError::Startup("refused".to_string()));
            }
            Ok(())
        }

        async fn on_stop(&mut self) {
            self.counters.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn tasks(&self) -> Vec<Task<Self>> {
            vec![Task::new("tick", 1, tick)]
        }

        fn wait_time(&self) -> WaitTime {
            WaitTime::constant(Duration::from_millis(5))
        }
    }

    fn runner(users: usize) -> Runner {
        Runner::new(
            RunnerConfig {
                users,
                run_time: Duration::from_millis(100),
                host: Some("http://localhost:6334".to_string()),
            },
            Arc::new(NoopSink),
        )
    }

    #[tokio::test]
    async fn test_hooks_called_once_per_user() {
        let counters = Arc::new(Counters::default());
        let shared = counters.clone();

        let summary = runner(3)
            .run(move |ctx| {
                let counters = shared.clone();
                async move {
                    assert_eq!(ctx.host.as_deref(), Some("http://localhost:6334"));
                    Ok::<_, LoadgenError>(CountingUser {
                        counters,
                        fail_start: false,
                    })
                }
            })
            .await;

        assert_eq!(summary.users_started, 3);
        assert_eq!(summary.startup_failures, 0);
        assert_eq!(counters.starts.load(Ordering::SeqCst), 3);
        assert_eq!(counters.stops.load(Ordering::SeqCst), 3);
        assert!(summary.tasks_run >= 3);
        assert_eq!(summary.tasks_run as usize, counters.ticks.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_failed_start_runs_no_tasks() {
        let counters = Arc::new(Counters::default());
        let shared = counters.clone();

        let summary = runner(2)
            .run(move |_| {
                let counters = shared.clone();
                async move {
                    Ok::<_, LoadgenError>(CountingUser {
                        counters,
                        fail_start: true,
                    })
                }
            })
            .await;

        assert_eq!(summary.users_started, 0);
        assert_eq!(summary.startup_failures, 2);
        assert_eq!(counters.ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_factory_error_counts_as_startup_failure() {
        let summary = runner(2)
            .run(|_| async {
                Err::<CountingUser, _>(LoadgenError::Config("missing collection".to_string()))
            })
            .await;

        assert_eq!(summary.users_started, 0);
        assert_eq!(summary.startup_failures, 2);
        assert_eq!(summary.tasks_run, 0);
    }
}
