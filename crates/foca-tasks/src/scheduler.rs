//! Periodic job scheduling.
//!
//! Jobs run on cron expressions (with seconds field, e.g.
//! `0 0 3 * * * *` for 03:00 daily). Each scheduled job loops forever:
//! sleep until the next occurrence, run the job to completion, repeat.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use cron::Schedule;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{TaskError, TaskResult};

/// Unique identifier for a scheduled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scheduler for periodic background jobs.
///
/// # Example
///
/// ```
/// use foca_tasks::Scheduler;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let scheduler = Scheduler::new();
/// let id = scheduler
///     .schedule("nightly-cleanup", "0 0 3 * * * *", || async {
///         // prune expired records
///     })
///     .unwrap();
///
/// scheduler.cancel(id);
/// # }
/// ```
#[derive(Default)]
pub struct Scheduler {
    jobs: Arc<DashMap<JobId, JoinHandle<()>>>,
}

impl Scheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a job on a cron expression.
    ///
    /// The job factory is invoked once per occurrence; a slow run delays
    /// subsequent occurrences rather than overlapping them.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidSchedule` if the expression does not
    /// parse.
    pub fn schedule<F, Fut>(
        &self,
        name: impl Into<String>,
        expression: &str,
        job: F,
    ) -> TaskResult<JobId>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let schedule = Schedule::from_str(expression).map_err(|_| TaskError::InvalidSchedule {
            expression: expression.to_string(),
        })?;

        let name = name.into();
        let id = JobId::new();
        let jobs = self.jobs.clone();

        let handle = tokio::spawn(async move {
            info!(job_id = %id, job_name = %name, "periodic job scheduled");

            loop {
                let Some(next) = schedule.upcoming(Utc).next() else {
                    warn!(job_id = %id, job_name = %name, "schedule has no upcoming occurrence");
                    break;
                };

                let delay = (next - Utc::now()).to_std().unwrap_or_default();
                tokio::time::sleep(delay).await;

                debug!(job_id = %id, job_name = %name, "running periodic job");
                job().await;
            }

            jobs.remove(&id);
        });

        self.jobs.insert(id, handle);
        Ok(id)
    }

    /// Cancels a scheduled job.
    ///
    /// Returns whether the job existed.
    pub fn cancel(&self, id: JobId) -> bool {
        if let Some((_, handle)) = self.jobs.remove(&id) {
            handle.abort();
            true
        } else {
            false
        }
    }

    /// Returns the number of scheduled jobs.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Cancels all scheduled jobs.
    pub fn shutdown(&self) {
        for entry in self.jobs.iter() {
            entry.value().abort();
        }
        self.jobs.clear();
        info!("scheduler shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_invalid_expression() {
        let scheduler = Scheduler::new();
        let result = scheduler.schedule("broken", "not a cron line", || async {});
        assert!(matches!(result, Err(TaskError::InvalidSchedule { .. })));
    }

    #[tokio::test]
    async fn test_job_runs_every_second() {
        let scheduler = Scheduler::new();
        let runs = Arc::new(AtomicU32::new(0));
        let counter = runs.clone();

        let id = scheduler
            .schedule("ticker", "* * * * * * *", move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            })
            .unwrap();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        scheduler.cancel(id);

        assert!(runs.load(Ordering::Relaxed) >= 2);
    }

    #[tokio::test]
    async fn test_cancel_unknown_job() {
        let scheduler = Scheduler::new();
        let id = scheduler.schedule("short", "* * * * * * *", || async {}).unwrap();

        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
    }

    #[tokio::test]
    async fn test_shutdown_clears_jobs() {
        let scheduler = Scheduler::new();
        scheduler.schedule("a", "* * * * * * *", || async {}).unwrap();
        scheduler.schedule("b", "* * * * * * *", || async {}).unwrap();

        assert_eq!(scheduler.job_count(), 2);
        scheduler.shutdown();
        assert_eq!(scheduler.job_count(), 0);
    }
}
