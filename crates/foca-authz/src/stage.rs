//! Access-control enforcement middleware stage.
//!
//! Identifies the caller from the configured user headers, stores the
//! identity in the request context, and asks the policy engine whether
//! `(subject, path, method)` is allowed. Requests without an identity are
//! rejected as unauthorized; denied requests are rejected as forbidden.
//! Both rejections go through the problem registry.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use foca_core::{CallerIdentity, FocaError, ProblemRegistry};
use foca_middleware::context::MiddlewareContext;
use foca_middleware::middleware::{BoxFuture, Middleware, Next};
use foca_middleware::types::{Request, Response, ResponseExt};

use crate::error::AuthzResult;

/// Policy-decision seam for the enforcement stage.
///
/// Implemented by [`AccessControl`](crate::AccessControl); tests can
/// substitute a stub.
#[async_trait]
pub trait Enforce: Send + Sync {
    /// Returns whether `(sub, obj, act)` is allowed.
    async fn enforce(&self, sub: &str, obj: &str, act: &str) -> AuthzResult<bool>;
}

/// Middleware stage enforcing access-control policies.
pub struct AccessControlStage {
    enforcer: Arc<dyn Enforce>,
    problems: Arc<ProblemRegistry>,
    user_headers: Vec<String>,
    exempt_paths: Vec<String>,
}

impl AccessControlStage {
    /// Creates an enforcement stage.
    ///
    /// `user_headers` are checked in order; the first present header
    /// provides the policy subject. The liveness route is exempt by
    /// default.
    #[must_use]
    pub fn new(
        enforcer: Arc<dyn Enforce>,
        problems: Arc<ProblemRegistry>,
        user_headers: Vec<String>,
    ) -> Self {
        Self {
            enforcer,
            problems,
            user_headers,
            exempt_paths: vec!["/healthz".to_string()],
        }
    }

    /// Replaces the set of paths exempt from enforcement.
    #[must_use]
    pub fn with_exempt_paths(mut self, paths: Vec<String>) -> Self {
        self.exempt_paths = paths;
        self
    }

    fn extract_user(&self, request: &Request) -> Option<String> {
        self.user_headers.iter().find_map(|header| {
            request
                .headers()
                .get(header.as_str())
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        })
    }

    fn problem_response(&self, err: &FocaError) -> Response {
        Response::problem(&self.problems.respond(err))
    }
}

impl Middleware for AccessControlStage {
    fn name(&self) -> &'static str {
        "access_control"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let path = request.uri().path().to_string();

            if self.exempt_paths.iter().any(|p| p == &path) {
                return next.run(ctx, request).await;
            }

            let Some(user) = self.extract_user(&request) else {
                return self.problem_response(&FocaError::unauthorized(
                    "no user identity supplied",
                ));
            };

            ctx.set_identity(CallerIdentity::user(user.clone()));

            let method = request.method().as_str().to_string();
            match self.enforcer.enforce(&user, &path, &method).await {
                Ok(true) => {
                    debug!(user = %user, path = %path, method = %method, "access allowed");
                    next.run(ctx, request).await
                }
                Ok(false) => self.problem_response(&FocaError::forbidden(
                    "the requester is not authorized to perform this action",
                )),
                Err(err) => self.problem_response(&FocaError::internal_with_source(
                    "policy evaluation failed",
                    err,
                )),
            }
        })
    }
}
