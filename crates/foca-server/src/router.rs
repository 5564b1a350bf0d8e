//! Operation routing.
//!
//! FOCA does not implement a routing framework: registered operations are
//! matched segment-exactly against path templates with `{param}`
//! placeholders, which is just enough to dispatch the operations a
//! service registers from its API configuration.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;

use crate::handler::OperationHandler;

/// Path parameters captured during route matching.
pub type PathParams = HashMap<String, String>;

/// One segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed path template such as `/pets/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    segments: Vec<Segment>,
}

impl RouteTemplate {
    /// Parses a path template.
    ///
    /// Segments wrapped in braces capture the corresponding request
    /// segment as a named parameter.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|segment| {
                segment
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                    .map_or_else(
                        || Segment::Literal(segment.to_string()),
                        |name| Segment::Param(name.to_string()),
                    )
            })
            .collect();
        Self { segments }
    }

    /// Matches a request path against the template.
    ///
    /// Returns the captured parameters on a match.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let segments: Vec<_> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (template, actual) in self.segments.iter().zip(segments) {
            match template {
                Segment::Literal(expected) => {
                    if expected != actual {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.insert(name.clone(), actual.to_string());
                }
            }
        }
        Some(params)
    }
}

/// A registered operation.
pub struct Route {
    /// Operation identifier (logged and exposed to handlers).
    pub operation_id: String,
    /// HTTP method.
    pub method: Method,
    /// Path template.
    pub template: RouteTemplate,
    /// The operation handler.
    pub handler: Arc<dyn OperationHandler>,
}

/// Result of resolving a request against the registered operations.
pub enum RouteOutcome<'a> {
    /// A registered operation matched.
    Matched {
        /// The matched route.
        route: &'a Route,
        /// Captured path parameters.
        params: PathParams,
    },
    /// The path matched a template but with a different method.
    MethodMismatch,
    /// No template matched the path.
    NotFound,
}

/// Registry of operations, resolved in registration order.
#[derive(Default)]
pub struct OperationRouter {
    routes: Vec<Route>,
}

impl OperationRouter {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an operation.
    pub fn register(
        &mut self,
        operation_id: impl Into<String>,
        method: Method,
        path: &str,
        handler: Arc<dyn OperationHandler>,
    ) {
        self.routes.push(Route {
            operation_id: operation_id.into(),
            method,
            template: RouteTemplate::parse(path),
            handler,
        });
    }

    /// Resolves a request to a registered operation.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> RouteOutcome<'_> {
        let mut path_matched = false;

        for route in &self.routes {
            if let Some(params) = route.template.matches(path) {
                if &route.method == method {
                    return RouteOutcome::Matched { route, params };
                }
                path_matched = true;
            }
        }

        if path_matched {
            RouteOutcome::MethodMismatch
        } else {
            RouteOutcome::NotFound
        }
    }

    /// Returns the number of registered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns whether no operations are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
