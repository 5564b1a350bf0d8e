//! Application error type for FOCA services.
//!
//! [`FocaError`] is the standard error type flowing out of handlers and
//! middleware. Each variant corresponds to an entry in the default problem
//! mapping (see [`crate::problem::ProblemRegistry`]); the [`FocaError::kind`]
//! method yields the stable string key used for the lookup.

use http::StatusCode;
use thiserror::Error;

/// Result type alias using [`FocaError`].
pub type FocaResult<T> = Result<T, FocaError>;

/// Standard error type for FOCA-based services.
///
/// `FocaError` provides structured errors with:
/// - A stable kind string used to look up problem documents
/// - A default HTTP status code per kind
/// - Error chaining support for internal errors
///
/// # Example
///
/// ```
/// use foca_core::FocaError;
///
/// fn fetch_pet(id: &str) -> Result<(), FocaError> {
///     if id.is_empty() {
///         return Err(FocaError::bad_request("pet identifier must not be empty"));
///     }
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum FocaError {
    /// The request is malformed.
    #[error("Bad request: {message}")]
    BadRequest {
        /// Human-readable error message.
        message: String,
    },

    /// The request lacks valid credentials.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Human-readable error message.
        message: String,
    },

    /// The requester is not permitted to perform this action.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Human-readable error message.
        message: String,
    },

    /// The requested resource does not exist.
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal server error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },

    /// An upstream dependency returned an invalid response.
    #[error("Bad gateway: {message}")]
    BadGateway {
        /// Human-readable error message.
        message: String,
    },

    /// The service is temporarily unable to handle the request.
    #[error("Service unavailable: {message}")]
    ServiceUnavailable {
        /// Human-readable error message.
        message: String,
    },

    /// An upstream dependency did not respond in time.
    #[error("Gateway timeout: {message}")]
    GatewayTimeout {
        /// Human-readable error message.
        message: String,
    },

    /// Application-defined error with its own mapping key.
    #[error("{message}")]
    Custom {
        /// Mapping key used for problem lookup.
        kind: String,
        /// Human-readable error message.
        message: String,
        /// HTTP status used when no mapping entry overrides it.
        status: StatusCode,
    },
}

impl FocaError {
    /// Creates a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates an internal error with a message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error wrapping an underlying error.
    #[must_use]
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a bad gateway error.
    #[must_use]
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::BadGateway {
            message: message.into(),
        }
    }

    /// Creates a service unavailable error.
    #[must_use]
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// Creates a gateway timeout error.
    #[must_use]
    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::GatewayTimeout {
            message: message.into(),
        }
    }

    /// Creates a custom error with its own mapping key.
    #[must_use]
    pub fn custom(
        kind: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self::Custom {
            kind: kind.into(),
            message: message.into(),
            status,
        }
    }

    /// Returns the stable kind string used for problem-document lookup.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::BadRequest { .. } => "bad_request",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::Internal { .. } => "internal_server_error",
            Self::BadGateway { .. } => "bad_gateway",
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::GatewayTimeout { .. } => "gateway_timeout",
            Self::Custom { kind, .. } => kind,
        }
    }

    /// Returns the default HTTP status code for this error.
    ///
    /// The problem registry may override this via the configured mapping;
    /// this value is used when no mapping entry applies. Note that
    /// `ServiceUnavailable` maps to 502, matching the default mapping table.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadGateway { .. } | Self::ServiceUnavailable { .. } => StatusCode::BAD_GATEWAY,
            Self::GatewayTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Custom { status, .. } => *status,
        }
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message }
            | Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::NotFound { message }
            | Self::Internal { message, .. }
            | Self::BadGateway { message }
            | Self::ServiceUnavailable { message }
            | Self::GatewayTimeout { message }
            | Self::Custom { message, .. } => message,
        }
    }
}

impl From<std::io::Error> for FocaError {
    fn from(err: std::io::Error) -> Self {
        Self::internal_with_source("I/O error", err)
    }
}

impl From<serde_json::Error> for FocaError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal_with_source("JSON serialization error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strings() {
        assert_eq!(FocaError::bad_request("x").kind(), "bad_request");
        assert_eq!(FocaError::unauthorized("x").kind(), "unauthorized");
        assert_eq!(FocaError::forbidden("x").kind(), "forbidden");
        assert_eq!(FocaError::not_found("x").kind(), "not_found");
        assert_eq!(FocaError::internal("x").kind(), "internal_server_error");
        assert_eq!(FocaError::bad_gateway("x").kind(), "bad_gateway");
        assert_eq!(
            FocaError::service_unavailable("x").kind(),
            "service_unavailable"
        );
        assert_eq!(FocaError::gateway_timeout("x").kind(), "gateway_timeout");
    }

    #[test]
    fn test_default_status_codes() {
        assert_eq!(FocaError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            FocaError::unauthorized("x").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(FocaError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(FocaError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            FocaError::internal("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            FocaError::gateway_timeout("x").status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_service_unavailable_maps_to_bad_gateway_status() {
        // The default mapping table deliberately uses 502 here.
        assert_eq!(
            FocaError::service_unavailable("down").status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_custom_error() {
        let err = FocaError::custom("task_not_found", "no such task", StatusCode::NOT_FOUND);
        assert_eq!(err.kind(), "task_not_found");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "no such task");
    }

    #[test]
    fn test_internal_error_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = FocaError::internal_with_source("storage failed", io);

        let source = std::error::Error::source(&err);
        assert!(source.is_some());
        assert!(source.unwrap().to_string().contains("disk on fire"));
    }

    #[test]
    fn test_display_includes_message() {
        let err = FocaError::not_found("pet 42 does not exist");
        assert!(err.to_string().contains("pet 42 does not exist"));
    }
}
