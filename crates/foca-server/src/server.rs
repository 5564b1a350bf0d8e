//! HTTP server bootstrap.
//!
//! The [`App`] wires together the middleware pipeline, the operation
//! router, and the problem registry, then serves requests on Hyper. All
//! routing and error handling beyond operation dispatch is owned by the
//! registered components.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use http::Method;
use http_body_util::BodyExt;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use foca_config::ServerSettings;
use foca_core::{FocaError, ProblemRegistry};
use foca_middleware::context::MiddlewareContext;
use foca_middleware::middleware::BoxFuture;
use foca_middleware::pipeline::{BoxedMiddleware, Pipeline};
use foca_middleware::types::{Request, Response, ResponseExt};

use crate::handler::{OperationHandler, OperationRequest};
use crate::health::{HealthCheck, HEALTH_PATH};
use crate::router::{OperationRouter, RouteOutcome};
use crate::shutdown::ShutdownSignal;

/// Errors that can occur while serving.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Failed to bind the listen address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error while accepting connections.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A configured FOCA application.
///
/// Built through [`AppBuilder`]; [`App::dispatch`] processes a single
/// request (usable directly in tests), [`App::run`] serves until
/// interrupted.
#[derive(Clone)]
pub struct App {
    settings: ServerSettings,
    router: Arc<OperationRouter>,
    pipeline: Arc<Pipeline>,
    problems: Arc<ProblemRegistry>,
    health: Arc<HealthCheck>,
}

impl App {
    /// Creates an application builder.
    #[must_use]
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    /// Returns the server settings.
    #[must_use]
    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// Returns the problem registry.
    #[must_use]
    pub fn problems(&self) -> &Arc<ProblemRegistry> {
        &self.problems
    }

    /// Processes a single request through the pipeline and router.
    pub async fn dispatch(&self, request: Request) -> Response {
        let router = self.router.clone();
        let problems = self.problems.clone();
        let health = self.health.clone();

        self.pipeline
            .process(
                MiddlewareContext::new(),
                request,
                move |ctx: &mut MiddlewareContext, request: Request| -> BoxFuture<'static, Response> {
                    let method = request.method().clone();
                    let path = request.uri().path().to_string();

                    if method == Method::GET && path == HEALTH_PATH {
                        let response = health.response();
                        return Box::pin(async move { response });
                    }

                    match router.resolve(&method, &path) {
                        RouteOutcome::Matched { route, params } => {
                            ctx.set_operation_id(route.operation_id.clone());

                            let operation_request = OperationRequest {
                                request_id: ctx.request_id(),
                                identity: ctx.identity().clone(),
                                operation_id: route.operation_id.clone(),
                                params,
                                request,
                            };

                            let handler = route.handler.clone();
                            let operation_id = route.operation_id.clone();
                            Box::pin(async move {
                                debug!(operation_id = %operation_id, "operation dispatched");
                                match handler.call(operation_request).await {
                                    Ok(response) => response,
                                    Err(err) => Response::problem(&problems.respond(&err)),
                                }
                            })
                        }
                        RouteOutcome::MethodMismatch => {
                            let err = FocaError::custom(
                                "method_not_allowed",
                                format!("method {method} is not allowed for {path}"),
                                http::StatusCode::METHOD_NOT_ALLOWED,
                            );
                            let response = Response::problem(&problems.respond(&err));
                            Box::pin(async move { response })
                        }
                        RouteOutcome::NotFound => {
                            let err = FocaError::not_found(format!(
                                "the requested URL {path} was not found on the server"
                            ));
                            let response = Response::problem(&problems.respond(&err));
                            Box::pin(async move { response })
                        }
                    }
                },
            )
            .await
    }

    /// Serves until an OS interrupt is received.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the listen address cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Serves until the given shutdown signal fires, then drains open
    /// connections within the configured shutdown timeout.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the listen address cannot be bound.
    pub async fn run_with_shutdown(
        self,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let addr = self.settings.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;

        info!(addr = %addr, operations = self.router.len(), "server listening");

        let open_connections = Arc::new(AtomicUsize::new(0));

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = accepted?;
                    debug!(peer = %peer, "connection accepted");

                    let app = self.clone();
                    let open = open_connections.clone();
                    open.fetch_add(1, Ordering::Relaxed);

                    tokio::spawn(async move {
                        let service = service_fn(move |incoming: http::Request<hyper::body::Incoming>| {
                            let app = app.clone();
                            async move {
                                let (parts, body) = incoming.into_parts();
                                let bytes = body.collect().await?.to_bytes();
                                let request =
                                    http::Request::from_parts(parts, http_body_util::Full::new(bytes));
                                Ok::<_, hyper::Error>(app.dispatch(request).await)
                            }
                        });

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(TokioIo::new(stream), service)
                            .await
                        {
                            debug!(error = %err, "connection error");
                        }

                        open.fetch_sub(1, Ordering::Relaxed);
                    });
                }
                _ = shutdown.wait() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        self.drain(&open_connections).await;
        info!("server stopped");
        Ok(())
    }

    /// Waits for open connections to finish, up to the shutdown timeout.
    async fn drain(&self, open_connections: &AtomicUsize) {
        let deadline = tokio::time::Instant::now()
            + Duration::from_secs(self.settings.shutdown_timeout_secs);

        while open_connections.load(Ordering::Relaxed) > 0 {
            if tokio::time::Instant::now() >= deadline {
                warn!(
                    open = open_connections.load(Ordering::Relaxed),
                    "shutdown timeout reached with open connections"
                );
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

/// Builder assembling an [`App`] from settings, stages, operations, and
/// the problem registry.
pub struct AppBuilder {
    settings: ServerSettings,
    stages: Vec<BoxedMiddleware>,
    problems: ProblemRegistry,
    router: OperationRouter,
    service_name: String,
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AppBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            settings: ServerSettings::default(),
            stages: Vec::new(),
            problems: ProblemRegistry::new(),
            router: OperationRouter::new(),
            service_name: "foca".to_string(),
        }
    }

    /// Sets the server settings.
    #[must_use]
    pub fn settings(mut self, settings: ServerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Appends a middleware stage.
    ///
    /// Stages run in registration order, the first being outermost.
    #[must_use]
    pub fn stage(mut self, stage: BoxedMiddleware) -> Self {
        self.stages.push(stage);
        self
    }

    /// Sets the problem registry.
    #[must_use]
    pub fn problems(mut self, problems: ProblemRegistry) -> Self {
        self.problems = problems;
        self
    }

    /// Sets the service name reported by the liveness route.
    #[must_use]
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Registers an operation.
    #[must_use]
    pub fn operation(
        mut self,
        operation_id: impl Into<String>,
        method: Method,
        path: &str,
        handler: Arc<dyn OperationHandler>,
    ) -> Self {
        self.router.register(operation_id, method, path, handler);
        self
    }

    /// Builds the application.
    #[must_use]
    pub fn build(self) -> App {
        App {
            settings: self.settings,
            router: Arc::new(self.router),
            pipeline: Arc::new(Pipeline::new(self.stages)),
            problems: Arc::new(self.problems),
            health: Arc::new(HealthCheck::new(
                self.service_name,
                env!("CARGO_PKG_VERSION"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::fn_handler;
    use bytes::Bytes;
    use foca_middleware::stages::{RequestIdStage, REQUEST_ID_HEADER};
    use http::StatusCode;
    use http_body_util::Full;

    fn pet_app() -> App {
        App::builder()
            .stage(Arc::new(RequestIdStage::new()))
            .operation(
                "getPet",
                Method::GET,
                "/pets/{id}",
                fn_handler(|req: OperationRequest| async move {
                    let id = req.param("id").unwrap_or_default().to_string();
                    if id == "0" {
                        return Err(FocaError::not_found("no such pet"));
                    }
                    Ok(Response::json(
                        StatusCode::OK,
                        &serde_json::json!({"id": id}),
                    ))
                }),
            )
            .build()
    }

    fn get(path: &str) -> Request {
        http::Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_matched_operation() {
        let app = pet_app();
        let response = app.dispatch(get("/pets/42")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_dispatch_handler_error_is_problem() {
        let app = pet_app();
        let response = app.dispatch(get("/pets/0")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            foca_core::PROBLEM_CONTENT_TYPE
        );
    }

    #[tokio::test]
    async fn test_dispatch_unknown_path_is_not_found_problem() {
        let app = pet_app();
        let response = app.dispatch(get("/owners")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_dispatch_method_mismatch_uses_fallback_problem() {
        let app = pet_app();
        let request = http::Request::builder()
            .method(Method::DELETE)
            .uri("/pets/42")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = app.dispatch(request).await;

        // No mapping entry exists for method mismatches, so the fallback
        // document (500) answers, matching the default mapping table.
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_dispatch_health_route() {
        let app = pet_app();
        let response = app.dispatch(get("/healthz")).await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_serve_and_shutdown() {
        let app = App::builder()
            .settings(ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 0,
                shutdown_timeout_secs: 1,
                ..Default::default()
            })
            .build();

        let (signal, handle) = ShutdownSignal::manual();
        let server = tokio::spawn(app.run_with_shutdown(signal));

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.shutdown();

        let result = tokio::time::timeout(Duration::from_secs(2), server)
            .await
            .expect("server should stop")
            .expect("task should join");
        assert!(result.is_ok());
    }
}
