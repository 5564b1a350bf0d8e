//! Request-ID middleware stage.
//!
//! Propagates an incoming `X-Request-Id` header or generates a fresh UUID
//! v7, stores it in the context, and echoes it on the response so clients
//! and logs can be correlated.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use foca_core::RequestId;
use http::HeaderValue;

/// Name of the request-ID header.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that assigns every request a unique identifier.
#[derive(Debug, Clone, Default)]
pub struct RequestIdStage {
    _private: (),
}

impl RequestIdStage {
    /// Creates a new request-ID stage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Extracts a valid request ID from the incoming headers.
    fn incoming_id(request: &Request) -> Option<RequestId> {
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
    }
}

impl Middleware for RequestIdStage {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if let Some(id) = Self::incoming_id(&request) {
                ctx.set_request_id(id);
            }
            let id = ctx.request_id();

            let mut response = next.run(ctx, request).await;

            if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }

            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use http_body_util::Full;

    fn ok_handler() -> Next<'static> {
        Next::handler(|_ctx, _req| {
            Box::pin(async {
                HttpResponse::builder()
                    .status(StatusCode::OK)
                    .body(Full::new(Bytes::new()))
                    .unwrap()
            })
        })
    }

    #[tokio::test]
    async fn test_generates_request_id() {
        let stage = RequestIdStage::new();
        let mut ctx = MiddlewareContext::new();
        let request = HttpRequest::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = stage.process(&mut ctx, request, ok_handler()).await;

        let header = response.headers().get(REQUEST_ID_HEADER).unwrap();
        assert_eq!(header.to_str().unwrap(), ctx.request_id().to_string());
    }

    #[tokio::test]
    async fn test_propagates_incoming_request_id() {
        let stage = RequestIdStage::new();
        let mut ctx = MiddlewareContext::new();
        let incoming = RequestId::new();

        let request = HttpRequest::builder()
            .uri("/test")
            .header(REQUEST_ID_HEADER, incoming.to_string())
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = stage.process(&mut ctx, request, ok_handler()).await;

        assert_eq!(ctx.request_id(), incoming);
        assert_eq!(
            response
                .headers()
                .get(REQUEST_ID_HEADER)
                .unwrap()
                .to_str()
                .unwrap(),
            incoming.to_string()
        );
    }

    #[tokio::test]
    async fn test_invalid_incoming_id_is_replaced() {
        let stage = RequestIdStage::new();
        let mut ctx = MiddlewareContext::new();
        let original = ctx.request_id();

        let request = HttpRequest::builder()
            .uri("/test")
            .header(REQUEST_ID_HEADER, "not-a-uuid")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let _ = stage.process(&mut ctx, request, ok_handler()).await;

        // The bogus header is ignored; the generated ID stands.
        assert_eq!(ctx.request_id(), original);
    }
}
