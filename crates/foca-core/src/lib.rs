//! Core types for FOCA-based microservices.
//!
//! This crate holds the one genuinely algorithmic piece of FOCA: the
//! problem-response error-mapping subsystem. Given an application error, a
//! user-configurable registry maps its kind to a structured problem
//! document (RFC-9457-style JSON), applies public/private member
//! projection, and logs the error with a configurable verbosity format.
//!
//! It also provides the [`FocaError`] application error type and the
//! request identity types shared by the middleware and server crates.
//!
//! # Example
//!
//! ```
//! use foca_core::{FocaError, ProblemRegistry};
//!
//! let registry = ProblemRegistry::builder()
//!     .public_members(vec![vec!["title".to_string()], vec!["status".to_string()]])
//!     .build()
//!     .expect("default mapping is valid");
//!
//! let problem = registry.respond(&FocaError::forbidden("no access to pet 42"));
//! assert_eq!(problem.status.as_u16(), 403);
//! ```

#![warn(missing_docs)]

mod error;
mod identity;
pub mod problem;
pub mod projection;

pub use error::{FocaError, FocaResult};
pub use identity::{CallerIdentity, RequestId};
pub use problem::{
    error_to_string, log_error, Problem, ProblemError, ProblemLogFormat, ProblemRegistry,
    ProblemRegistryBuilder, DEFAULT_KIND, PROBLEM_CONTENT_TYPE,
};
pub use projection::{exclude_nested, get_by_path, subset_nested};
