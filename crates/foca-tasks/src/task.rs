//! Task identity and lifecycle types.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Unique identifier for a background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generate a new unique task ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Queued and waiting to run.
    Pending,
    /// Currently running.
    Running,
    /// Completed successfully.
    Completed,
    /// Failed with an error.
    Failed,
    /// Cancelled before completing.
    Cancelled,
    /// Exceeded its timeout.
    TimedOut,
}

impl TaskState {
    /// Returns whether the task is in a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::TimedOut
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed_out",
        };
        write!(f, "{s}")
    }
}

/// Record of a task's lifecycle.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    /// Unique task identifier.
    pub id: TaskId,
    /// Human-readable task name.
    pub name: String,
    /// Current state.
    pub state: TaskState,
    /// When the task was submitted.
    pub created_at: DateTime<Utc>,
    /// When the task started running.
    pub started_at: Option<DateTime<Utc>>,
    /// When the task reached a terminal state.
    pub finished_at: Option<DateTime<Utc>>,
    /// Error message for failed tasks.
    pub error: Option<String>,
}

impl TaskRecord {
    /// Creates a pending record.
    #[must_use]
    pub fn new(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            state: TaskState::Pending,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    /// Marks the task as running.
    pub fn mark_started(&mut self) {
        self.state = TaskState::Running;
        self.started_at = Some(Utc::now());
    }

    /// Marks the task terminal with the given state.
    pub fn mark_finished(&mut self, state: TaskState) {
        self.state = state;
        self.finished_at = Some(Utc::now());
    }

    /// Marks the task failed with an error message.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.mark_finished(TaskState::Failed);
    }
}

/// Aggregate task counters.
#[derive(Debug, Default)]
pub struct TaskCounters {
    /// Total tasks submitted.
    pub submitted: AtomicU64,
    /// Tasks completed successfully.
    pub completed: AtomicU64,
    /// Tasks cancelled.
    pub cancelled: AtomicU64,
    /// Tasks timed out.
    pub timed_out: AtomicU64,
}

impl TaskCounters {
    /// Records a submission.
    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a completion.
    pub fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a cancellation.
    pub fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a timeout.
    pub fn record_timed_out(&self) {
        self.timed_out.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the total submitted count.
    #[must_use]
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Returns the completed count.
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Returns the cancelled count.
    #[must_use]
    pub fn cancelled(&self) -> u64 {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Returns the timed-out count.
    #[must_use]
    pub fn timed_out(&self) -> u64 {
        self.timed_out.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_unique() {
        assert_ne!(TaskId::new(), TaskId::new());
    }

    #[test]
    fn test_state_terminal() {
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::Running.is_terminal());
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(TaskState::Cancelled.is_terminal());
        assert!(TaskState::TimedOut.is_terminal());
    }

    #[test]
    fn test_record_lifecycle() {
        let mut record = TaskRecord::new(TaskId::new(), "cleanup");
        assert_eq!(record.state, TaskState::Pending);

        record.mark_started();
        assert_eq!(record.state, TaskState::Running);
        assert!(record.started_at.is_some());

        record.mark_finished(TaskState::Completed);
        assert_eq!(record.state, TaskState::Completed);
        assert!(record.finished_at.is_some());
    }

    #[test]
    fn test_record_failure() {
        let mut record = TaskRecord::new(TaskId::new(), "doomed");
        record.mark_started();
        record.mark_failed("broker unavailable");

        assert_eq!(record.state, TaskState::Failed);
        assert_eq!(record.error.as_deref(), Some("broker unavailable"));
    }

    #[test]
    fn test_counters() {
        let counters = TaskCounters::default();
        counters.record_submitted();
        counters.record_completed();

        assert_eq!(counters.submitted(), 1);
        assert_eq!(counters.completed(), 1);
        assert_eq!(counters.cancelled(), 0);
    }
}
