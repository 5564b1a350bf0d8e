//! Operation handler seam.
//!
//! Handlers receive the matched request together with its path parameters
//! and request context, and return either a response or a [`FocaError`]
//! that the dispatcher maps through the problem registry.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use foca_core::{CallerIdentity, FocaResult, RequestId};
use foca_middleware::middleware::BoxFuture;
use foca_middleware::types::{Request, Response};

/// The request as seen by an operation handler.
pub struct OperationRequest {
    /// The request ID assigned by the pipeline.
    pub request_id: RequestId,
    /// The caller identity established by the pipeline.
    pub identity: CallerIdentity,
    /// The resolved operation ID.
    pub operation_id: String,
    /// Path parameters captured by the route template.
    pub params: HashMap<String, String>,
    /// The HTTP request with its collected body.
    pub request: Request,
}

impl OperationRequest {
    /// Returns a path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// An operation handler.
pub trait OperationHandler: Send + Sync {
    /// Handles the request.
    fn call(&self, request: OperationRequest) -> BoxFuture<'static, FocaResult<Response>>;
}

struct FnHandler<F> {
    func: F,
}

impl<F, Fut> OperationHandler for FnHandler<F>
where
    F: Fn(OperationRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FocaResult<Response>> + Send + 'static,
{
    fn call(&self, request: OperationRequest) -> BoxFuture<'static, FocaResult<Response>> {
        Box::pin((self.func)(request))
    }
}

/// Wraps an async function as an [`OperationHandler`].
///
/// # Example
///
/// ```
/// use foca_server::handler::{fn_handler, OperationRequest};
/// use foca_middleware::{Response, ResponseExt};
/// use http::StatusCode;
///
/// let handler = fn_handler(|req: OperationRequest| async move {
///     let id = req.param("id").unwrap_or("unknown").to_string();
///     Ok(Response::json(StatusCode::OK, &serde_json::json!({"id": id})))
/// });
/// ```
pub fn fn_handler<F, Fut>(func: F) -> Arc<dyn OperationHandler>
where
    F: Fn(OperationRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FocaResult<Response>> + Send + 'static,
{
    Arc::new(FnHandler { func })
}
