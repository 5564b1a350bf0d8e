//! Middleware pipeline for FOCA-based services.
//!
//! FOCA wraps every registered operation in a small fixed-shape pipeline:
//!
//! ```text
//! Request → CORS → RequestId → Traffic → Handler (+ problem mapping)
//! ```
//!
//! The CORS stage runs outermost so preflight requests short-circuit
//! before any other processing; the request-ID stage assigns or propagates
//! the correlation ID; the traffic stage logs start and completion of
//! every request. Handler errors are mapped to problem responses at
//! dispatch via [`foca_core::ProblemRegistry`], which plays the role of
//! the single registered exception handler.

#![warn(missing_docs)]

pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use context::MiddlewareContext;
pub use middleware::{BoxFuture, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline};
pub use types::{Request, Response, ResponseExt};
