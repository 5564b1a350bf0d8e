//! Structured logging driven by the `log` configuration section.
//!
//! Logging integrates with the tracing-subscriber ecosystem. A service
//! configures level, output format, and field options in its YAML
//! configuration; [`init_logging`] installs a matching subscriber.
//!
//! A misconfigured level does not abort startup: the subscriber falls back
//! to the default settings and a warning is emitted, so a service never
//! fails to boot because of a bad log directive.
//!
//! # Example
//!
//! ```rust,ignore
//! use foca_telemetry::{init_logging, LogSettings};
//!
//! init_logging(&LogSettings::default());
//! tracing::info!(operation = "getPet", "processing request");
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::{TelemetryError, TelemetryResult};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutputFormat {
    /// Human-readable output for development.
    #[default]
    Pretty,
    /// JSON output for production log aggregation.
    Json,
}

/// Logging settings, bound from the `log` configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LogSettings {
    /// Log level or filter directive (e.g. `info`, `foca=debug`).
    pub level: String,

    /// Output format.
    pub format: LogOutputFormat,

    /// Whether to include file/line info in log events.
    pub include_location: bool,

    /// Whether to use ANSI colors (pretty format only).
    pub ansi: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogOutputFormat::Pretty,
            include_location: false,
            ansi: true,
        }
    }
}

impl LogSettings {
    /// Creates production settings: JSON output at info level, no colors.
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            format: LogOutputFormat::Json,
            include_location: false,
            ansi: false,
        }
    }
}

/// Initializes the logging subsystem from settings.
///
/// An invalid level directive falls back to the default settings with a
/// warning instead of failing. Re-initialization (for example in tests)
/// is tolerated: if a global subscriber is already installed, the call is
/// a no-op.
pub fn init_logging(settings: &LogSettings) {
    let (filter, fallback) = match EnvFilter::try_new(&settings.level) {
        Ok(filter) => (filter, false),
        Err(_) => (
            EnvFilter::new(LogSettings::default().level),
            true,
        ),
    };

    let defaults = LogSettings::default();
    let settings = if fallback { &defaults } else { settings };

    let result = match settings.format {
        LogOutputFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_file(settings.include_location)
                .with_line_number(settings.include_location)
                .with_filter(filter);
            tracing_subscriber::registry().with(fmt_layer).try_init()
        }
        LogOutputFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_ansi(settings.ansi)
                .with_file(settings.include_location)
                .with_line_number(settings.include_location)
                .with_filter(filter);
            tracing_subscriber::registry().with(fmt_layer).try_init()
        }
    };

    // A subscriber may already be installed (tests, embedding apps).
    if result.is_err() {
        tracing::debug!("logging already initialized, keeping existing subscriber");
    }

    if fallback {
        tracing::warn!(
            "failed to configure logging, falling back to default settings"
        );
    }
}

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` if the directive is invalid.
pub fn create_env_filter(directive: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(directive).map_err(|e| TelemetryError::InvalidFilter(e.to_string()))
}

/// Standard log field names used across FOCA crates.
pub mod fields {
    /// Request ID field name.
    pub const REQUEST_ID: &str = "request_id";

    /// Operation ID field name.
    pub const OPERATION_ID: &str = "operation_id";

    /// HTTP method field name.
    pub const HTTP_METHOD: &str = "http.method";

    /// HTTP path field name.
    pub const HTTP_PATH: &str = "http.path";

    /// HTTP status code field name.
    pub const HTTP_STATUS: &str = "http.status_code";

    /// Duration field name (in milliseconds).
    pub const DURATION_MS: &str = "duration_ms";

    /// Error field name.
    pub const ERROR: &str = "error";
}
