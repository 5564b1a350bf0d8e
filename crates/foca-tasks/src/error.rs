//! Task error types.

use thiserror::Error;

/// Result type alias for task operations.
pub type TaskResult<T> = Result<T, TaskError>;

/// Errors that can occur when running background tasks.
#[derive(Error, Debug)]
pub enum TaskError {
    /// The runner has reached its concurrency limit.
    #[error("task runner is saturated ({limit} tasks running)")]
    Saturated {
        /// The configured concurrency limit.
        limit: usize,
    },

    /// The runner has been shut down.
    #[error("task runner is shut down")]
    Shutdown,

    /// The task was cancelled before completing.
    #[error("task was cancelled")]
    Cancelled,

    /// The task exceeded its timeout.
    #[error("task timed out")]
    TimedOut,

    /// The task panicked.
    #[error("task panicked")]
    Panicked,

    /// A cron expression could not be parsed.
    #[error("invalid cron schedule '{expression}'")]
    InvalidSchedule {
        /// The offending expression.
        expression: String,
    },

    /// Internal runner error.
    #[error("internal task error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturated_display() {
        let err = TaskError::Saturated { limit: 8 };
        assert!(err.to_string().contains('8'));
    }

    #[test]
    fn test_invalid_schedule_display() {
        let err = TaskError::InvalidSchedule {
            expression: "* * *".to_string(),
        };
        assert!(err.to_string().contains("* * *"));
    }
}
