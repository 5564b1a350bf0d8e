//! Common types used throughout the middleware pipeline.

use bytes::Bytes;
use http_body_util::Full;

use foca_core::{Problem, PROBLEM_CONTENT_TYPE};

/// The HTTP request type used in the middleware pipeline.
///
/// A standard `http::Request` with a `Full<Bytes>` body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware pipeline.
///
/// A standard `http::Response` with a `Full<Bytes>` body.
pub type Response = http::Response<Full<Bytes>>;

/// Extension trait for building common responses.
pub trait ResponseExt {
    /// Creates a plain-text response with the given status code.
    fn text(status: http::StatusCode, message: &str) -> Response;

    /// Creates a JSON response from a serialized value.
    fn json(status: http::StatusCode, value: &serde_json::Value) -> Response;

    /// Creates a problem response (`application/problem+json`).
    ///
    /// A problem without a document yields an empty body, matching the
    /// bare-500 fallback of the problem registry.
    fn problem(problem: &Problem) -> Response;
}

impl ResponseExt for Response {
    fn text(status: http::StatusCode, message: &str) -> Response {
        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Full::new(Bytes::from(message.to_string())))
            .expect("failed to build text response")
    }

    fn json(status: http::StatusCode, value: &serde_json::Value) -> Response {
        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(value.to_string())))
            .expect("failed to build JSON response")
    }

    fn problem(problem: &Problem) -> Response {
        http::Response::builder()
            .status(problem.status)
            .header(http::header::CONTENT_TYPE, PROBLEM_CONTENT_TYPE)
            .body(Full::new(Bytes::from(problem.to_body())))
            .expect("failed to build problem response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foca_core::{FocaError, ProblemRegistry};
    use http::StatusCode;

    #[test]
    fn test_text_response() {
        let response = Response::text(StatusCode::BAD_REQUEST, "nope");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_json_response() {
        let response = Response::json(StatusCode::OK, &serde_json::json!({"ok": true}));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_problem_response() {
        let registry = ProblemRegistry::new();
        let problem = registry.respond(&FocaError::not_found("missing"));
        let response = Response::problem(&problem);

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            PROBLEM_CONTENT_TYPE
        );
    }
}
