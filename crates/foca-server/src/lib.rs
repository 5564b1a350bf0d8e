//! HTTP server bootstrap for FOCA-based services.
//!
//! This crate is deliberately thin: it registers operations (method, path
//! template, handler), wraps them in the middleware pipeline, maps handler
//! errors through the problem registry, and runs the Hyper serve loop with
//! graceful shutdown and a built-in liveness route. It is not a routing
//! framework; matching is segment-exact with `{param}` captures, just
//! enough to dispatch registered operations.
//!
//! # Example
//!
//! ```no_run
//! use foca_server::{App, handler::fn_handler};
//! use foca_middleware::{Response, ResponseExt};
//! use http::{Method, StatusCode};
//!
//! # async fn run() -> Result<(), foca_server::ServerError> {
//! let app = App::builder()
//!     .operation(
//!         "getPet",
//!         Method::GET,
//!         "/pets/{id}",
//!         fn_handler(|req| async move {
//!             let id = req.param("id").unwrap_or_default().to_string();
//!             Ok(Response::json(StatusCode::OK, &serde_json::json!({"id": id})))
//!         }),
//!     )
//!     .build();
//!
//! app.run().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod handler;
mod health;
mod router;
mod server;
mod shutdown;

pub use handler::{fn_handler, OperationHandler, OperationRequest};
pub use health::{HealthCheck, HEALTH_PATH};
pub use router::{OperationRouter, PathParams, Route, RouteOutcome, RouteTemplate};
pub use server::{App, AppBuilder, ServerError};
pub use shutdown::{ShutdownHandle, ShutdownSignal};
