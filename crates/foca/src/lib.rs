//! # FOCA
//!
//! **Configuration-driven scaffolding for microservices**
//!
//! FOCA wires together an HTTP server, a MongoDB document store, policy
//! enforcement, a background task runner, CORS handling, and a generic
//! problem-response error-mapping core, all from a single YAML
//! configuration file. It is not itself a web framework, storage engine,
//! or policy evaluator; every piece of non-trivial behavior is delegated
//! to the underlying components, and FOCA's job is to parse, validate,
//! and register.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use foca::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let foca = Foca::new(Some("config.yaml".as_ref()))?;
//!
//!     let db = foca.create_db().await?;
//!
//!     let app = foca
//!         .create_app()?
//!         .operation("getPet", http::Method::GET, "/pets/{id}", fn_handler(get_pet))
//!         .build();
//!
//!     app.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Bootstrap order
//!
//! Initialization follows a fixed order: configuration is parsed and
//! validated, logging is configured, then the app is assembled (CORS,
//! request IDs, traffic logging, problem registry), the database is
//! registered, access control is wired when authentication is required,
//! and the task runner is created when a `jobs` section is present.

#![warn(missing_docs)]

mod bootstrap;

pub use bootstrap::{BootstrapError, Foca};

// Re-export component crates
pub use foca_authz as authz;
pub use foca_config as config;
pub use foca_core as core;
pub use foca_db as db;
pub use foca_middleware as middleware;
pub use foca_server as server;
pub use foca_tasks as tasks;
pub use foca_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use foca::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bootstrap::{BootstrapError, Foca};

    pub use foca_core::{
        CallerIdentity, FocaError, FocaResult, Problem, ProblemLogFormat, ProblemRegistry,
        RequestId,
    };

    pub use foca_config::{AppConfig, ConfigLoader};

    pub use foca_middleware::{Response, ResponseExt};

    pub use foca_server::{fn_handler, App, AppBuilder, OperationRequest, ShutdownSignal};

    pub use foca_db::MongoRegistry;

    pub use foca_authz::{AccessControl, PermissionRule, PermissionStore};

    pub use foca_tasks::{Scheduler, TaskRunner};
}
