//! Traffic-logging middleware stage.
//!
//! Logs every request at start and completion with the request ID, HTTP
//! method, path, response status, and duration. This replaces decorating
//! individual handlers: once the stage is installed, all registered
//! operations are logged uniformly.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use tracing::info;

/// Middleware that logs request/response traffic.
#[derive(Debug, Clone, Default)]
pub struct TrafficStage {
    _private: (),
}

impl TrafficStage {
    /// Creates a new traffic-logging stage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Middleware for TrafficStage {
    fn name(&self) -> &'static str {
        "traffic"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let method = request.method().clone();
            let path = request.uri().path().to_string();
            let request_id = ctx.request_id();

            info!(
                request_id = %request_id,
                http.method = %method,
                http.path = %path,
                "incoming request"
            );

            let started = std::time::Instant::now();
            let response = next.run(ctx, request).await;
            let duration_ms = started.elapsed().as_millis();

            info!(
                request_id = %request_id,
                http.method = %method,
                http.path = %path,
                http.status_code = response.status().as_u16(),
                duration_ms = duration_ms as u64,
                "request completed"
            );

            response
        })
    }
}
