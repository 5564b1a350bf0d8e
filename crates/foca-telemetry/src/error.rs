//! Telemetry error types.

use thiserror::Error;

/// Result type alias for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Errors that can occur during telemetry setup.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Failed to initialize the logging subsystem.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Invalid log filter directive.
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::LoggingInit("boom".to_string());
        assert!(err.to_string().contains("boom"));
    }
}
