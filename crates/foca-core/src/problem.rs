//! Problem-document registry and error-to-response mapping.
//!
//! This is the core of FOCA: given an application error, look up a
//! user-configurable problem document (an RFC-9457-style JSON object),
//! extract the HTTP status from a configurable member path, apply
//! public/private member projection, and log the error with a configurable
//! verbosity format.
//!
//! # Example
//!
//! ```
//! use foca_core::{FocaError, ProblemRegistry};
//!
//! let registry = ProblemRegistry::new();
//! let problem = registry.respond(&FocaError::not_found("no such pet"));
//!
//! assert_eq!(problem.status.as_u16(), 404);
//! assert!(problem.document.is_some());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::error;

use crate::error::FocaError;
use crate::projection::{exclude_nested, get_by_path, subset_nested};

/// Content type of problem responses.
pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// Mapping key of the fallback problem document.
pub const DEFAULT_KIND: &str = "default";

/// Verbosity format for logging handled errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemLogFormat {
    /// Error and full source chain on a single line.
    #[default]
    Oneline,
    /// Kind and message only.
    Minimal,
    /// Error and source chain across multiple lines.
    Regular,
    /// Suppress error logging entirely.
    None,
}

impl fmt::Display for ProblemLogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Oneline => "oneline",
            Self::Minimal => "minimal",
            Self::Regular => "regular",
            Self::None => "none",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ProblemLogFormat {
    type Err = ProblemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oneline" => Ok(Self::Oneline),
            "minimal" => Ok(Self::Minimal),
            "regular" => Ok(Self::Regular),
            "none" => Ok(Self::None),
            other => Err(ProblemError::InvalidLogFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// Errors raised when building a [`ProblemRegistry`] from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ProblemError {
    /// The mapping lacks the mandatory fallback entry.
    #[error("problem mapping is missing the '{DEFAULT_KIND}' fallback entry")]
    MissingDefault,

    /// A mapping entry is not a JSON object.
    #[error("problem mapping entry '{kind}' is not an object")]
    NotAnObject {
        /// Mapping key of the offending entry.
        kind: String,
    },

    /// The status member path does not resolve in a mapping entry.
    #[error("problem mapping entry '{kind}' has no member at the status path")]
    MissingStatus {
        /// Mapping key of the offending entry.
        kind: String,
    },

    /// The status member is not a valid HTTP status code.
    #[error("problem mapping entry '{kind}' has a non-integer or out-of-range status")]
    InvalidStatus {
        /// Mapping key of the offending entry.
        kind: String,
    },

    /// Both public and private members were configured.
    #[error("public and private members are mutually exclusive")]
    ConflictingProjection,

    /// A projection member path is absent from a mapping entry.
    #[error("member path '{path}' does not resolve in problem mapping entry '{kind}'")]
    UnknownMember {
        /// Mapping key of the offending entry.
        kind: String,
        /// Dotted rendering of the unresolved member path.
        path: String,
    },

    /// Unrecognized error log format.
    #[error("error logging is misconfigured: unknown format '{format}'")]
    InvalidLogFormat {
        /// The unrecognized format string.
        format: String,
    },
}

/// A problem response ready to be serialized.
///
/// `document` is `None` when status extraction failed; the response is then
/// a bare 500 with an empty body, still carrying the problem content type.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    /// HTTP status of the response.
    pub status: StatusCode,
    /// Filtered problem document, if one could be produced.
    pub document: Option<Value>,
}

impl Problem {
    /// Serializes the problem document to a JSON body.
    ///
    /// An absent document serializes to an empty body.
    #[must_use]
    pub fn to_body(&self) -> Vec<u8> {
        self.document
            .as_ref()
            .map(|doc| doc.to_string().into_bytes())
            .unwrap_or_default()
    }
}

/// Registry mapping error kinds to problem documents.
///
/// The registry is built once from configuration and consulted for every
/// handled error. Lookup falls back to the mandatory `default` entry for
/// kinds without an explicit mapping.
#[derive(Debug, Clone)]
pub struct ProblemRegistry {
    mapping: BTreeMap<String, Value>,
    status_member: Vec<String>,
    public_members: Option<Vec<Vec<String>>>,
    private_members: Option<Vec<Vec<String>>>,
    logging: ProblemLogFormat,
}

impl Default for ProblemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProblemRegistry {
    /// Creates a registry with the default mapping table.
    ///
    /// The defaults cover the standard error kinds of [`FocaError`], with
    /// `service_unavailable` mapped to 502.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mapping: default_mapping(),
            status_member: vec!["status".to_string()],
            public_members: None,
            private_members: None,
            logging: ProblemLogFormat::Oneline,
        }
    }

    /// Creates a registry builder.
    #[must_use]
    pub fn builder() -> ProblemRegistryBuilder {
        ProblemRegistryBuilder::new()
    }

    /// Returns the configured log format.
    #[must_use]
    pub fn log_format(&self) -> ProblemLogFormat {
        self.logging
    }

    /// Returns the problem document for a kind, falling back to `default`.
    #[must_use]
    pub fn document(&self, kind: &str) -> &Value {
        self.mapping
            .get(kind)
            .or_else(|| self.mapping.get(DEFAULT_KIND))
            .unwrap_or(&Value::Null)
    }

    /// Maps an error to a problem response.
    ///
    /// Looks up the document for the error's kind, extracts the status via
    /// the configured status member path, logs the error per the configured
    /// format, and applies public/private member projection. If the status
    /// cannot be extracted, the error is logged and a bare 500 problem
    /// without a document is returned.
    #[must_use]
    pub fn respond(&self, err: &FocaError) -> Problem {
        let doc = self.document(err.kind());

        let status = get_by_path(doc, &self.status_member)
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
            .and_then(|s| StatusCode::from_u16(s).ok());

        let Some(status) = status else {
            if self.logging != ProblemLogFormat::None {
                log_error(err, self.logging);
            }
            return Problem {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                document: None,
            };
        };

        if self.logging != ProblemLogFormat::None {
            error!(problem = %doc, "handled application error");
            log_error(err, self.logging);
        }

        let kept = if let Some(members) = &self.public_members {
            let mut kept = Map::new();
            for member in members {
                if let Value::Object(subset) = subset_nested(doc, member) {
                    kept.extend(subset);
                }
            }
            Value::Object(kept)
        } else if let Some(members) = &self.private_members {
            let mut kept = doc.clone();
            for member in members {
                exclude_nested(&mut kept, member);
            }
            kept
        } else {
            doc.clone()
        };

        Problem {
            status,
            document: Some(kept),
        }
    }
}

/// Builder for [`ProblemRegistry`], validating the configured mapping.
#[derive(Debug, Default)]
pub struct ProblemRegistryBuilder {
    mapping: Option<BTreeMap<String, Value>>,
    status_member: Option<Vec<String>>,
    public_members: Option<Vec<Vec<String>>>,
    private_members: Option<Vec<Vec<String>>>,
    logging: ProblemLogFormat,
}

impl ProblemRegistryBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the kind-to-document mapping, replacing the defaults.
    #[must_use]
    pub fn mapping(mut self, mapping: BTreeMap<String, Value>) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Sets the key path locating the HTTP status inside each document.
    #[must_use]
    pub fn status_member(mut self, path: Vec<String>) -> Self {
        self.status_member = Some(path);
        self
    }

    /// Restricts returned documents to the union of the given member paths.
    #[must_use]
    pub fn public_members(mut self, members: Vec<Vec<String>>) -> Self {
        self.public_members = Some(members);
        self
    }

    /// Removes the given member paths from returned documents.
    #[must_use]
    pub fn private_members(mut self, members: Vec<Vec<String>>) -> Self {
        self.private_members = Some(members);
        self
    }

    /// Sets the error log format.
    #[must_use]
    pub fn logging(mut self, format: ProblemLogFormat) -> Self {
        self.logging = format;
        self
    }

    /// Builds and validates the registry.
    ///
    /// # Errors
    ///
    /// Returns `ProblemError` if:
    /// - the mapping has no `default` entry
    /// - any entry is not an object, or lacks an integer status in the
    ///   100..=599 range at the status member path
    /// - both public and private members are configured
    /// - a projection member path does not resolve in some entry
    pub fn build(self) -> Result<ProblemRegistry, ProblemError> {
        let mapping = self.mapping.unwrap_or_else(default_mapping);
        let status_member = self
            .status_member
            .unwrap_or_else(|| vec!["status".to_string()]);

        if !mapping.contains_key(DEFAULT_KIND) {
            return Err(ProblemError::MissingDefault);
        }

        if self.public_members.is_some() && self.private_members.is_some() {
            return Err(ProblemError::ConflictingProjection);
        }

        for (kind, doc) in &mapping {
            if !doc.is_object() {
                return Err(ProblemError::NotAnObject { kind: kind.clone() });
            }

            let status = get_by_path(doc, &status_member)
                .ok_or_else(|| ProblemError::MissingStatus { kind: kind.clone() })?;
            let valid = status
                .as_u64()
                .is_some_and(|s| (100..=599).contains(&s));
            if !valid {
                return Err(ProblemError::InvalidStatus { kind: kind.clone() });
            }

            let members = self
                .public_members
                .iter()
                .chain(self.private_members.iter())
                .flatten();
            for member in members {
                if get_by_path(doc, member).is_none() {
                    return Err(ProblemError::UnknownMember {
                        kind: kind.clone(),
                        path: member.join("."),
                    });
                }
            }
        }

        Ok(ProblemRegistry {
            mapping,
            status_member,
            public_members: self.public_members,
            private_members: self.private_members,
            logging: self.logging,
        })
    }
}

/// The built-in kind-to-document mapping table.
fn default_mapping() -> BTreeMap<String, Value> {
    let mut mapping = BTreeMap::new();
    mapping.insert(
        DEFAULT_KIND.to_string(),
        json!({"title": "Internal Server Error", "status": 500}),
    );
    mapping.insert(
        "bad_request".to_string(),
        json!({"title": "Bad Request", "status": 400}),
    );
    mapping.insert(
        "unauthorized".to_string(),
        json!({"title": "Unauthorized", "status": 401}),
    );
    mapping.insert(
        "forbidden".to_string(),
        json!({"title": "Forbidden", "status": 403}),
    );
    mapping.insert(
        "not_found".to_string(),
        json!({"title": "Not Found", "status": 404}),
    );
    mapping.insert(
        "internal_server_error".to_string(),
        json!({"title": "Internal Server Error", "status": 500}),
    );
    mapping.insert(
        "bad_gateway".to_string(),
        json!({"title": "Bad Gateway", "status": 502}),
    );
    mapping.insert(
        "service_unavailable".to_string(),
        json!({"title": "Service Unavailable", "status": 502}),
    );
    mapping.insert(
        "gateway_timeout".to_string(),
        json!({"title": "Gateway Timeout", "status": 504}),
    );
    mapping
}

/// Renders an error and its source chain as a list of lines.
fn error_lines(err: &FocaError) -> Vec<String> {
    let mut lines = vec![format!("{}: {}", err.kind(), err)];
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        lines.push(format!("caused by: {cause}"));
        source = cause.source();
    }
    lines
}

/// Converts an error, including its source chain, to a string.
///
/// Lines are joined with the given delimiter; the default delimiter used by
/// the oneline format is the literal two-character sequence `\n`.
#[must_use]
pub fn error_to_string(err: &FocaError, delimiter: &str) -> String {
    error_lines(err).join(delimiter)
}

/// Logs an error with the indicated verbosity format.
///
/// `oneline` logs the error and its full source chain on a single line,
/// `minimal` logs kind and message only, and `regular` logs the chain
/// across multiple lines. `none` is handled by callers and logs nothing
/// here.
pub fn log_error(err: &FocaError, format: ProblemLogFormat) {
    match format {
        ProblemLogFormat::Oneline => error!("{}", error_to_string(err, "\\n")),
        ProblemLogFormat::Minimal => error!("{}: {}", err.kind(), err.message()),
        ProblemLogFormat::Regular => error!("{}", error_to_string(err, "\n")),
        ProblemLogFormat::None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom_mapping() -> BTreeMap<String, Value> {
        let mut mapping = BTreeMap::new();
        mapping.insert(
            DEFAULT_KIND.to_string(),
            json!({
                "title": "Internal Server Error",
                "status": 500,
                "details": {"trace": "secret", "hint": "try again"},
            }),
        );
        mapping.insert(
            "not_found".to_string(),
            json!({
                "title": "Not Found",
                "status": 404,
                "details": {"trace": "secret", "hint": "check the id"},
            }),
        );
        mapping
    }

    #[test]
    fn test_default_registry_covers_standard_kinds() {
        let registry = ProblemRegistry::new();
        for kind in [
            "bad_request",
            "unauthorized",
            "forbidden",
            "not_found",
            "internal_server_error",
            "bad_gateway",
            "service_unavailable",
            "gateway_timeout",
        ] {
            assert!(registry.document(kind).is_object(), "missing kind {kind}");
        }
    }

    #[test]
    fn test_lookup_falls_back_to_default() {
        let registry = ProblemRegistry::new();
        let doc = registry.document("no_such_kind");
        assert_eq!(doc["title"], json!("Internal Server Error"));
        assert_eq!(doc["status"], json!(500));
    }

    #[test]
    fn test_respond_known_kind() {
        let registry = ProblemRegistry::new();
        let problem = registry.respond(&FocaError::not_found("missing"));

        assert_eq!(problem.status, StatusCode::NOT_FOUND);
        let doc = problem.document.unwrap();
        assert_eq!(doc["title"], json!("Not Found"));
    }

    #[test]
    fn test_respond_unknown_kind_uses_fallback() {
        let registry = ProblemRegistry::new();
        let err = FocaError::custom("weird", "odd failure", StatusCode::IM_A_TEAPOT);
        let problem = registry.respond(&err);

        // The fallback document wins over the error's own status.
        assert_eq!(problem.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_respond_service_unavailable_is_502() {
        let registry = ProblemRegistry::new();
        let problem = registry.respond(&FocaError::service_unavailable("down"));
        assert_eq!(problem.status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_respond_missing_status_member_yields_bare_500() {
        let mut mapping = default_mapping();
        mapping.insert("not_found".to_string(), json!({"title": "Not Found"}));

        // Build bypassing validation to exercise the runtime fallback.
        let registry = ProblemRegistry {
            mapping,
            status_member: vec!["status".to_string()],
            public_members: None,
            private_members: None,
            logging: ProblemLogFormat::None,
        };

        let problem = registry.respond(&FocaError::not_found("missing"));
        assert_eq!(problem.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(problem.document.is_none());
        assert!(problem.to_body().is_empty());
    }

    #[test]
    fn test_respond_public_members_projection() {
        let registry = ProblemRegistry::builder()
            .mapping(custom_mapping())
            .public_members(vec![vec!["title".to_string()]])
            .build()
            .unwrap();

        let problem = registry.respond(&FocaError::not_found("missing"));
        assert_eq!(problem.document.unwrap(), json!({"title": "Not Found"}));
    }

    #[test]
    fn test_respond_public_members_union() {
        let registry = ProblemRegistry::builder()
            .mapping(custom_mapping())
            .public_members(vec![
                vec!["title".to_string()],
                vec!["details".to_string(), "hint".to_string()],
            ])
            .build()
            .unwrap();

        let problem = registry.respond(&FocaError::not_found("missing"));
        assert_eq!(
            problem.document.unwrap(),
            json!({"title": "Not Found", "details": {"hint": "check the id"}})
        );
    }

    #[test]
    fn test_respond_private_members_projection() {
        let registry = ProblemRegistry::builder()
            .mapping(custom_mapping())
            .private_members(vec![vec!["details".to_string(), "trace".to_string()]])
            .build()
            .unwrap();

        let problem = registry.respond(&FocaError::not_found("missing"));
        assert_eq!(
            problem.document.unwrap(),
            json!({
                "title": "Not Found",
                "status": 404,
                "details": {"hint": "check the id"},
            })
        );
    }

    #[test]
    fn test_build_rejects_missing_default() {
        let mut mapping = BTreeMap::new();
        mapping.insert("not_found".to_string(), json!({"status": 404}));

        let result = ProblemRegistry::builder().mapping(mapping).build();
        assert!(matches!(result, Err(ProblemError::MissingDefault)));
    }

    #[test]
    fn test_build_rejects_conflicting_projection() {
        let result = ProblemRegistry::builder()
            .public_members(vec![vec!["title".to_string()]])
            .private_members(vec![vec!["status".to_string()]])
            .build();
        assert!(matches!(result, Err(ProblemError::ConflictingProjection)));
    }

    #[test]
    fn test_build_rejects_missing_status() {
        let mut mapping = default_mapping();
        mapping.insert("broken".to_string(), json!({"title": "Broken"}));

        let result = ProblemRegistry::builder().mapping(mapping).build();
        assert!(matches!(
            result,
            Err(ProblemError::MissingStatus { kind }) if kind == "broken"
        ));
    }

    #[test]
    fn test_build_rejects_out_of_range_status() {
        let mut mapping = default_mapping();
        mapping.insert("broken".to_string(), json!({"status": 9000}));

        let result = ProblemRegistry::builder().mapping(mapping).build();
        assert!(matches!(
            result,
            Err(ProblemError::InvalidStatus { kind }) if kind == "broken"
        ));
    }

    #[test]
    fn test_build_rejects_unresolved_member_path() {
        let result = ProblemRegistry::builder()
            .mapping(custom_mapping())
            .public_members(vec![vec!["no_such_member".to_string()]])
            .build();
        assert!(matches!(
            result,
            Err(ProblemError::UnknownMember { path, .. }) if path == "no_such_member"
        ));
    }

    #[test]
    fn test_build_custom_status_member_path() {
        let mut mapping = BTreeMap::new();
        mapping.insert(
            DEFAULT_KIND.to_string(),
            json!({"meta": {"code": 500}, "title": "Oops"}),
        );

        let registry = ProblemRegistry::builder()
            .mapping(mapping)
            .status_member(vec!["meta".to_string(), "code".to_string()])
            .build()
            .unwrap();

        let problem = registry.respond(&FocaError::internal("boom"));
        assert_eq!(problem.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(problem.document.unwrap()["title"], json!("Oops"));
    }

    #[test]
    fn test_error_to_string_joins_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "inner cause");
        let err = FocaError::internal_with_source("outer failure", io);

        let oneline = error_to_string(&err, "\\n");
        assert!(oneline.contains("outer failure"));
        assert!(oneline.contains("inner cause"));
        assert!(oneline.contains("\\n"));
        assert!(!oneline.contains('\n'));

        let regular = error_to_string(&err, "\n");
        assert_eq!(regular.lines().count(), 2);
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!(
            "oneline".parse::<ProblemLogFormat>().unwrap(),
            ProblemLogFormat::Oneline
        );
        assert_eq!(
            "minimal".parse::<ProblemLogFormat>().unwrap(),
            ProblemLogFormat::Minimal
        );
        assert_eq!(
            "regular".parse::<ProblemLogFormat>().unwrap(),
            ProblemLogFormat::Regular
        );
        assert_eq!(
            "none".parse::<ProblemLogFormat>().unwrap(),
            ProblemLogFormat::None
        );

        let err = "unknown_log_format".parse::<ProblemLogFormat>().unwrap_err();
        assert!(err.to_string().contains("logging is misconfigured"));
    }

    #[test]
    fn test_problem_to_body() {
        let registry = ProblemRegistry::new();
        let problem = registry.respond(&FocaError::bad_request("nope"));
        let body: Value = serde_json::from_slice(&problem.to_body()).unwrap();
        assert_eq!(body["status"], json!(400));
    }
}
