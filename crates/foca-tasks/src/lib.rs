//! Background task execution and scheduling for FOCA-based services.
//!
//! The `jobs` configuration section declares concurrency, timeout, and
//! history settings; [`TaskRunner::from_config`] turns it into a runner
//! executing named tasks on the async runtime. A [`Scheduler`] runs
//! periodic jobs on cron expressions on top of the same runtime.
//!
//! # Example
//!
//! ```
//! use foca_config::JobsConfig;
//! use foca_tasks::TaskRunner;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let runner = TaskRunner::from_config(&JobsConfig::default());
//!
//! let handle = runner.submit("index-rebuild", async { "done" }).unwrap();
//! assert_eq!(handle.join().await.unwrap(), "done");
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod runner;
mod scheduler;
mod task;

pub use error::{TaskError, TaskResult};
pub use runner::{TaskHandle, TaskRunner};
pub use scheduler::{JobId, Scheduler};
pub use task::{TaskCounters, TaskId, TaskRecord, TaskState};
