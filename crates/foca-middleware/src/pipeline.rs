//! Ordered middleware pipeline.
//!
//! FOCA wires a small, fixed-shape pipeline around every handler:
//!
//! ```text
//! Request → CORS → RequestId → Traffic → Handler (+ problem mapping)
//! ```
//!
//! The pipeline is assembled once at bootstrap from the application
//! configuration and is immutable afterwards.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use std::sync::Arc;

/// A type-erased middleware stage.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An ordered middleware pipeline.
///
/// # Example
///
/// ```ignore
/// use foca_middleware::pipeline::Pipeline;
/// use foca_middleware::stages::RequestIdStage;
/// use std::sync::Arc;
///
/// let pipeline = Pipeline::new(vec![Arc::new(RequestIdStage::new())]);
/// let response = pipeline.process(ctx, request, handler).await;
/// ```
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a pipeline from ordered stages.
    ///
    /// The first stage is outermost: it sees the request first and the
    /// response last.
    #[must_use]
    pub fn new(stages: Vec<BoxedMiddleware>) -> Self {
        Self { stages }
    }

    /// Creates an empty pipeline that only invokes the handler.
    #[must_use]
    pub fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    /// Processes a request through the pipeline.
    pub async fn process<H>(
        &self,
        mut ctx: MiddlewareContext,
        request: Request,
        handler: H,
    ) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        let next = self.build_chain(handler);
        next.run(&mut ctx, request).await
    }

    /// Builds the middleware chain for a request.
    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::chain(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of all stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use http_body_util::Full;

    struct CountingStage;

    impl Middleware for CountingStage {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                let count = ctx.get_extension::<u32>().copied().unwrap_or(0);
                ctx.set_extension(count + 1);
                next.run(ctx, request).await
            })
        }
    }

    fn make_request() -> Request {
        HttpRequest::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_pipeline_invokes_handler() {
        let pipeline = Pipeline::empty();
        let response = pipeline
            .process(MiddlewareContext::new(), make_request(), |_ctx, _req| {
                Box::pin(async {
                    HttpResponse::builder()
                        .status(StatusCode::OK)
                        .body(Full::new(Bytes::from("OK")))
                        .unwrap()
                })
            })
            .await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_all_stages_run() {
        let pipeline = Pipeline::new(vec![
            Arc::new(CountingStage),
            Arc::new(CountingStage),
            Arc::new(CountingStage),
        ]);

        assert_eq!(pipeline.stage_count(), 3);
        assert_eq!(pipeline.stage_names(), vec!["counting"; 3]);

        let response = pipeline
            .process(MiddlewareContext::new(), make_request(), |ctx, _req| {
                let count = ctx.get_extension::<u32>().copied().unwrap_or(0);
                Box::pin(async move {
                    HttpResponse::builder()
                        .status(StatusCode::OK)
                        .body(Full::new(Bytes::from(count.to_string())))
                        .unwrap()
                })
            })
            .await;

        assert_eq!(response.status(), StatusCode::OK);
    }
}
