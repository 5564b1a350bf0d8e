//! Background task runner.
//!
//! The runner executes named tasks on the async runtime with the
//! concurrency cap, default timeout, and history tracking declared in the
//! `jobs` configuration section. Tasks can be awaited through a
//! [`TaskHandle`] or submitted detached.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use foca_config::JobsConfig;

use crate::error::{TaskError, TaskResult};
use crate::task::{TaskCounters, TaskId, TaskRecord, TaskState};

/// A handle to a submitted task.
#[derive(Debug)]
pub struct TaskHandle<T> {
    id: TaskId,
    handle: JoinHandle<Option<T>>,
    cancel_tx: Option<oneshot::Sender<()>>,
}

impl<T> TaskHandle<T> {
    /// Returns the task ID.
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Returns whether the task has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Requests cancellation of the task.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Waits for the task to complete and returns its result.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Cancelled`, `TaskError::TimedOut`, or
    /// `TaskError::Panicked` when the task did not run to completion.
    pub async fn join(self) -> TaskResult<T> {
        match self.handle.await {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(TaskError::Cancelled),
            Err(e) if e.is_panic() => Err(TaskError::Panicked),
            Err(e) if e.is_cancelled() => Err(TaskError::Cancelled),
            Err(e) => Err(TaskError::Internal(e.to_string())),
        }
    }
}

struct RunnerInner {
    config: JobsConfig,
    registry: DashMap<TaskId, Arc<RwLock<TaskRecord>>>,
    counters: TaskCounters,
    running: AtomicU64,
    shut_down: AtomicBool,
}

/// Background task runner built from the `jobs` configuration section.
///
/// Cloning is cheap; clones share the same registry and counters.
///
/// # Example
///
/// ```
/// use foca_config::JobsConfig;
/// use foca_tasks::TaskRunner;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let runner = TaskRunner::from_config(&JobsConfig::default());
/// let handle = runner.submit("add", async { 1 + 2 }).unwrap();
/// assert_eq!(handle.join().await.unwrap(), 3);
/// # }
/// ```
#[derive(Clone)]
pub struct TaskRunner {
    inner: Arc<RunnerInner>,
}

impl TaskRunner {
    /// Creates a runner from configuration.
    #[must_use]
    pub fn from_config(config: &JobsConfig) -> Self {
        Self {
            inner: Arc::new(RunnerInner {
                config: config.clone(),
                registry: DashMap::new(),
                counters: TaskCounters::default(),
                running: AtomicU64::new(0),
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    /// Returns whether the runner has been shut down.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::Acquire)
    }

    /// Returns the number of currently running tasks.
    #[must_use]
    pub fn running_count(&self) -> u64 {
        self.inner.running.load(Ordering::Relaxed)
    }

    /// Returns the aggregate task counters.
    #[must_use]
    pub fn counters(&self) -> &TaskCounters {
        &self.inner.counters
    }

    /// Returns the record of a task, if tracked.
    #[must_use]
    pub fn record(&self, id: TaskId) -> Option<TaskRecord> {
        self.inner.registry.get(&id).map(|r| r.read().clone())
    }

    /// Returns the records of all tracked tasks.
    #[must_use]
    pub fn records(&self) -> Vec<TaskRecord> {
        self.inner
            .registry
            .iter()
            .map(|entry| entry.value().read().clone())
            .collect()
    }

    /// Submits a task with the configured default timeout.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Shutdown` after shutdown and
    /// `TaskError::Saturated` at the concurrency limit.
    pub fn submit<F, T>(&self, name: impl Into<String>, task: F) -> TaskResult<TaskHandle<T>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let timeout = self.inner.config.timeout_seconds.map(Duration::from_secs);
        self.submit_with_timeout(name, task, timeout)
    }

    /// Submits a task with an explicit timeout.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Shutdown` after shutdown and
    /// `TaskError::Saturated` at the concurrency limit.
    pub fn submit_with_timeout<F, T>(
        &self,
        name: impl Into<String>,
        task: F,
        timeout: Option<Duration>,
    ) -> TaskResult<TaskHandle<T>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let record = self.admit(name)?;
        let id = record.read().id;
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            record.write().mark_started();

            enum Outcome<T> {
                Completed(T),
                TimedOut,
                Cancelled,
            }

            let timed = async {
                match timeout {
                    Some(limit) => tokio::time::timeout(limit, task).await.ok(),
                    None => Some(task.await),
                }
            };

            let outcome = tokio::select! {
                value = timed => match value {
                    Some(value) => Outcome::Completed(value),
                    None => Outcome::TimedOut,
                },
                _ = cancel_rx => Outcome::Cancelled,
            };

            inner.running.fetch_sub(1, Ordering::Relaxed);

            match outcome {
                Outcome::Completed(value) => {
                    record.write().mark_finished(TaskState::Completed);
                    inner.counters.record_completed();
                    debug!(task_id = %id, "task completed");
                    Some(value)
                }
                Outcome::TimedOut => {
                    record.write().mark_finished(TaskState::TimedOut);
                    inner.counters.record_timed_out();
                    warn!(task_id = %id, "task timed out");
                    None
                }
                Outcome::Cancelled => {
                    record.write().mark_finished(TaskState::Cancelled);
                    inner.counters.record_cancelled();
                    info!(task_id = %id, "task cancelled");
                    None
                }
            }
        });

        Ok(TaskHandle {
            id,
            handle,
            cancel_tx: Some(cancel_tx),
        })
    }

    /// Submits a fire-and-forget task.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Shutdown` after shutdown and
    /// `TaskError::Saturated` at the concurrency limit.
    pub fn submit_detached<F>(&self, name: impl Into<String>, task: F) -> TaskResult<TaskId>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = self.submit(name, task)?;
        Ok(handle.id())
    }

    /// Shuts down the runner, draining running tasks within the deadline.
    pub async fn shutdown(&self, timeout: Duration) {
        info!("shutting down task runner");
        self.inner.shut_down.store(true, Ordering::Release);

        let deadline = tokio::time::Instant::now() + timeout;
        while self.inner.running.load(Ordering::Relaxed) > 0 {
            if tokio::time::Instant::now() >= deadline {
                warn!(
                    running = self.inner.running.load(Ordering::Relaxed),
                    "shutdown deadline reached with tasks still running"
                );
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        info!("task runner shut down");
    }

    /// Admission checks shared by all submission paths.
    fn admit(&self, name: impl Into<String>) -> TaskResult<Arc<RwLock<TaskRecord>>> {
        if self.is_shut_down() {
            return Err(TaskError::Shutdown);
        }

        let limit = self.inner.config.max_concurrent;
        if self.inner.running.load(Ordering::Relaxed) >= limit as u64 {
            return Err(TaskError::Saturated { limit });
        }

        let name = name.into();
        let id = TaskId::new();
        let record = Arc::new(RwLock::new(TaskRecord::new(id, name.clone())));

        if self.inner.config.track_history {
            self.inner.registry.insert(id, record.clone());
        }

        self.inner.running.fetch_add(1, Ordering::Relaxed);
        self.inner.counters.record_submitted();

        debug!(task_id = %id, task_name = %name, "task submitted");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner_with(max_concurrent: usize, timeout_seconds: Option<u64>) -> TaskRunner {
        TaskRunner::from_config(&JobsConfig {
            max_concurrent,
            timeout_seconds,
            track_history: true,
        })
    }

    #[tokio::test]
    async fn test_submit_and_join() {
        let runner = runner_with(10, None);

        let handle = runner.submit("add", async { 40 + 2 }).unwrap();
        assert_eq!(handle.join().await.unwrap(), 42);
        assert_eq!(runner.counters().completed(), 1);
    }

    #[tokio::test]
    async fn test_record_tracks_lifecycle() {
        let runner = runner_with(10, None);

        let handle = runner.submit("tracked", async {}).unwrap();
        let id = handle.id();
        handle.join().await.unwrap();

        let record = runner.record(id).unwrap();
        assert_eq!(record.state, TaskState::Completed);
        assert_eq!(record.name, "tracked");
    }

    #[tokio::test]
    async fn test_cancel() {
        let runner = runner_with(10, None);

        let mut handle = runner
            .submit("long", async {
                tokio::time::sleep(Duration::from_secs(60)).await;
            })
            .unwrap();

        handle.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(runner.counters().cancelled(), 1);
        assert_eq!(runner.running_count(), 0);
    }

    #[tokio::test]
    async fn test_timeout() {
        let runner = runner_with(10, None);

        let handle = runner
            .submit_with_timeout(
                "slow",
                async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                },
                Some(Duration::from_millis(20)),
            )
            .unwrap();

        let result = handle.join().await;
        assert!(result.is_err());
        assert_eq!(runner.counters().timed_out(), 1);
    }

    #[tokio::test]
    async fn test_saturation() {
        let runner = runner_with(1, None);

        let _running = runner
            .submit("occupier", async {
                tokio::time::sleep(Duration::from_secs(60)).await;
            })
            .unwrap();

        let result = runner.submit("rejected", async {});
        assert!(matches!(result, Err(TaskError::Saturated { limit: 1 })));
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_tasks() {
        let runner = runner_with(10, None);

        runner.shutdown(Duration::from_millis(100)).await;

        assert!(runner.is_shut_down());
        assert!(matches!(
            runner.submit("late", async {}),
            Err(TaskError::Shutdown)
        ));
    }

    #[tokio::test]
    async fn test_detached_task_is_tracked() {
        let runner = runner_with(10, None);

        let id = runner.submit_detached("detached", async {}).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let record = runner.record(id).unwrap();
        assert_eq!(record.state, TaskState::Completed);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let runner = runner_with(10, None);
        let clone = runner.clone();

        let handle = clone.submit("shared", async { 1 }).unwrap();
        handle.join().await.unwrap();

        assert_eq!(runner.counters().completed(), 1);
        assert_eq!(runner.records().len(), 1);
    }
}
