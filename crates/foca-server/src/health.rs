//! Built-in liveness endpoint.

use foca_middleware::types::{Response, ResponseExt};
use http::StatusCode;

/// Path of the built-in liveness route.
pub const HEALTH_PATH: &str = "/healthz";

/// Liveness check reporting service name and version.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    service: String,
    version: String,
}

impl HealthCheck {
    /// Creates a liveness check.
    #[must_use]
    pub fn new(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            version: version.into(),
        }
    }

    /// Builds the liveness response.
    #[must_use]
    pub fn response(&self) -> Response {
        Response::json(
            StatusCode::OK,
            &serde_json::json!({
                "status": "ok",
                "service": self.service,
                "version": self.version,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response() {
        let health = HealthCheck::new("petstore", "1.2.3");
        let response = health.response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
