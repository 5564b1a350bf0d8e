//! CORS (Cross-Origin Resource Sharing) middleware stage.
//!
//! Handles preflight OPTIONS requests and adds CORS headers to responses.
//! The stage runs outermost in the pipeline so preflights short-circuit
//! before any other processing.
//!
//! The unconfigured default matches FOCA's permissive posture: any origin,
//! any method, any header, credentials allowed. When credentials are
//! allowed together with the wildcard origin, the request origin is echoed
//! back instead of `*`, since browsers reject the combination of a literal
//! wildcard and credentials.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use bytes::Bytes;
use http::{header, HeaderValue, Method, StatusCode};
use http_body_util::Full;
use std::collections::HashSet;
use std::time::Duration;

/// CORS header names.
pub mod headers {
    /// `Access-Control-Allow-Origin` header.
    pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
    /// `Access-Control-Allow-Methods` header.
    pub const ALLOW_METHODS: &str = "access-control-allow-methods";
    /// `Access-Control-Allow-Headers` header.
    pub const ALLOW_HEADERS: &str = "access-control-allow-headers";
    /// `Access-Control-Allow-Credentials` header.
    pub const ALLOW_CREDENTIALS: &str = "access-control-allow-credentials";
    /// `Access-Control-Max-Age` header.
    pub const MAX_AGE: &str = "access-control-max-age";
    /// `Access-Control-Expose-Headers` header.
    pub const EXPOSE_HEADERS: &str = "access-control-expose-headers";
    /// `Access-Control-Request-Method` header (preflight).
    pub const REQUEST_METHOD: &str = "access-control-request-method";
    /// `Access-Control-Request-Headers` header (preflight).
    pub const REQUEST_HEADERS: &str = "access-control-request-headers";
    /// `Origin` header.
    pub const ORIGIN: &str = "origin";
    /// `Vary` header.
    pub const VARY: &str = "vary";
}

/// The set of allowed origins.
#[derive(Debug, Clone)]
pub enum AllowedOrigins {
    /// Allow any origin (wildcard `*`).
    Any,
    /// Allow specific origins.
    List(HashSet<String>),
}

impl AllowedOrigins {
    /// Checks whether an origin is allowed.
    #[must_use]
    pub fn is_allowed(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::List(origins) => origins.contains(origin),
        }
    }
}

/// The set of allowed methods.
#[derive(Debug, Clone)]
enum AllowedMethods {
    Any,
    List(HashSet<Method>),
}

impl AllowedMethods {
    fn is_allowed(&self, method: &Method) -> bool {
        match self {
            Self::Any => true,
            Self::List(methods) => methods.contains(method),
        }
    }

    fn header_value(&self) -> String {
        match self {
            Self::Any => "*".to_string(),
            Self::List(methods) => {
                let list: Vec<_> = methods.iter().map(Method::as_str).collect();
                list.join(", ")
            }
        }
    }
}

/// CORS middleware stage.
#[derive(Debug, Clone)]
pub struct CorsStage {
    allowed_origins: AllowedOrigins,
    allowed_methods: AllowedMethods,
    allowed_headers: HashSet<String>,
    expose_headers: Vec<String>,
    allow_credentials: bool,
    max_age: Option<Duration>,
}

impl Default for CorsStage {
    fn default() -> Self {
        Self::permissive()
    }
}

impl CorsStage {
    /// Creates the permissive default stage: any origin, any method, any
    /// header, credentials allowed.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            allowed_origins: AllowedOrigins::Any,
            allowed_methods: AllowedMethods::Any,
            allowed_headers: HashSet::from(["*".to_string()]),
            expose_headers: Vec::new(),
            allow_credentials: true,
            max_age: Some(Duration::from_secs(86400)),
        }
    }

    /// Creates a stage from explicit lists.
    ///
    /// A `*` entry in any list switches that dimension to wildcard mode.
    #[must_use]
    pub fn from_lists(
        origins: &[String],
        methods: &[String],
        headers: &[String],
        expose_headers: &[String],
        allow_credentials: bool,
        max_age: Option<Duration>,
    ) -> Self {
        let allowed_origins = if origins.iter().any(|o| o == "*") {
            AllowedOrigins::Any
        } else {
            AllowedOrigins::List(origins.iter().cloned().collect())
        };

        let allowed_methods = if methods.iter().any(|m| m == "*") {
            AllowedMethods::Any
        } else {
            AllowedMethods::List(
                methods
                    .iter()
                    .filter_map(|m| m.parse().ok())
                    .collect(),
            )
        };

        let allowed_headers = headers.iter().map(|h| h.to_lowercase()).collect();

        Self {
            allowed_origins,
            allowed_methods,
            allowed_headers,
            expose_headers: expose_headers.to_vec(),
            allow_credentials,
            max_age,
        }
    }

    /// Checks whether a request is a CORS preflight request.
    fn is_preflight(request: &Request) -> bool {
        request.method() == Method::OPTIONS
            && request.headers().contains_key(headers::ORIGIN)
            && request.headers().contains_key(headers::REQUEST_METHOD)
    }

    fn get_origin<'a>(request: &'a Request) -> Option<&'a str> {
        request
            .headers()
            .get(headers::ORIGIN)
            .and_then(|v| v.to_str().ok())
    }

    /// Returns the `Access-Control-Allow-Origin` value for an allowed origin.
    fn origin_header_value(&self, origin: &str) -> Option<HeaderValue> {
        match &self.allowed_origins {
            AllowedOrigins::Any if self.allow_credentials => HeaderValue::from_str(origin).ok(),
            AllowedOrigins::Any => Some(HeaderValue::from_static("*")),
            AllowedOrigins::List(origins) => {
                if origins.contains(origin) {
                    HeaderValue::from_str(origin).ok()
                } else {
                    None
                }
            }
        }
    }

    fn header_allowed(&self, header: &str) -> bool {
        self.allowed_headers.contains("*") || self.allowed_headers.contains(header)
    }

    /// Handles a preflight OPTIONS request.
    fn handle_preflight(&self, request: &Request) -> Response {
        let Some(origin) = Self::get_origin(request) else {
            return Self::forbidden("missing Origin header");
        };

        if !self.allowed_origins.is_allowed(origin) {
            return Self::forbidden("origin not allowed");
        }

        if let Some(requested) = request.headers().get(headers::REQUEST_METHOD) {
            let allowed = requested
                .to_str()
                .ok()
                .and_then(|s| s.parse::<Method>().ok())
                .is_some_and(|m| self.allowed_methods.is_allowed(&m));
            if !allowed {
                return Self::forbidden("method not allowed");
            }
        }

        if let Some(requested) = request.headers().get(headers::REQUEST_HEADERS) {
            if let Ok(list) = requested.to_str() {
                for header in list.split(',').map(|h| h.trim().to_lowercase()) {
                    if !self.header_allowed(&header) {
                        return Self::forbidden(&format!("header '{header}' not allowed"));
                    }
                }
            }
        }

        self.preflight_response(origin)
    }

    /// Creates a 204 No Content preflight response with CORS headers.
    fn preflight_response(&self, origin: &str) -> Response {
        let mut builder = http::Response::builder().status(StatusCode::NO_CONTENT);

        if let Some(value) = self.origin_header_value(origin) {
            builder = builder.header(headers::ALLOW_ORIGIN, value);
        }

        builder = builder.header(headers::ALLOW_METHODS, self.allowed_methods.header_value());

        if !self.allowed_headers.is_empty() {
            let mut list: Vec<_> = self.allowed_headers.iter().cloned().collect();
            list.sort();
            builder = builder.header(headers::ALLOW_HEADERS, list.join(", "));
        }

        if self.allow_credentials {
            builder = builder.header(headers::ALLOW_CREDENTIALS, "true");
        }

        if let Some(max_age) = self.max_age {
            builder = builder.header(headers::MAX_AGE, max_age.as_secs().to_string());
        }

        builder = builder.header(
            headers::VARY,
            "Origin, Access-Control-Request-Method, Access-Control-Request-Headers",
        );

        builder
            .body(Full::new(Bytes::new()))
            .expect("valid preflight response")
    }

    fn forbidden(message: &str) -> Response {
        http::Response::builder()
            .status(StatusCode::FORBIDDEN)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Full::new(Bytes::from(message.to_string())))
            .expect("valid forbidden response")
    }

    /// Adds CORS headers to a response for non-preflight requests.
    fn add_cors_headers(&self, response: &mut Response, origin: &str) {
        let headers_mut = response.headers_mut();

        if let Some(value) = self.origin_header_value(origin) {
            headers_mut.insert(headers::ALLOW_ORIGIN, value);
        }

        if self.allow_credentials {
            headers_mut.insert(headers::ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        }

        if !self.expose_headers.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&self.expose_headers.join(", ")) {
                headers_mut.insert(headers::EXPOSE_HEADERS, value);
            }
        }

        headers_mut.insert(headers::VARY, HeaderValue::from_static("Origin"));
    }
}

impl Middleware for CorsStage {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if Self::is_preflight(&request) {
                return self.handle_preflight(&request);
            }

            let origin = Self::get_origin(&request).map(String::from);

            let mut response = next.run(ctx, request).await;

            if let Some(ref origin) = origin {
                if self.allowed_origins.is_allowed(origin) {
                    self.add_cors_headers(&mut response, origin);
                }
            }

            response
        })
    }
}
