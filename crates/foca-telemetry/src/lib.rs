//! Structured logging for FOCA-based services.
//!
//! This crate wires the `log` section of the application configuration to
//! the tracing-subscriber ecosystem. It deliberately covers logging only:
//! FOCA services log through `tracing`, and anything beyond that (metrics,
//! trace export) is out of scope.
//!
//! # Example
//!
//! ```rust,ignore
//! use foca_telemetry::{init_logging, LogSettings};
//!
//! let settings = LogSettings::production();
//! init_logging(&settings);
//! ```

#![warn(missing_docs)]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{create_env_filter, fields, init_logging, LogOutputFormat, LogSettings};
