//! Configuration section types.
//!
//! Each type in this module binds one section of the YAML configuration
//! file. All sections are optional in the file and carry defaults matching
//! the behavior of an unconfigured service.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use foca_core::{ProblemError, ProblemLogFormat, ProblemRegistry};

/// HTTP server settings (`server` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServerSettings {
    /// Bind host.
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Whether debug behavior is enabled.
    pub debug: bool,

    /// Deployment environment label (e.g. `development`, `production`).
    pub environment: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Graceful shutdown drain timeout in seconds.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            debug: false,
            environment: "development".to_string(),
            request_timeout_secs: 30,
            shutdown_timeout_secs: 30,
        }
    }
}

impl ServerSettings {
    /// Returns the bind address as `host:port`.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Problem-mapping settings (`exceptions` section).
///
/// Binds the configuration of the problem registry: the kind-to-document
/// mapping, the status member path, projection members, and the error log
/// format. See [`foca_core::ProblemRegistry`] for the runtime behavior.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ExceptionsConfig {
    /// Mapping from error kind to problem document. When absent, the
    /// built-in default table is used.
    pub mapping: Option<BTreeMap<String, Value>>,

    /// Key path locating the HTTP status inside each document.
    pub status_member: Option<Vec<String>>,

    /// Member paths to keep in returned documents.
    pub public_members: Option<Vec<Vec<String>>>,

    /// Member paths to strip from returned documents.
    pub private_members: Option<Vec<Vec<String>>>,

    /// Error log verbosity format.
    pub logging: ProblemLogFormat,
}

impl ExceptionsConfig {
    /// Builds the validated problem registry from this section.
    ///
    /// # Errors
    ///
    /// Returns `ProblemError` when the configured mapping is inconsistent
    /// (missing fallback entry, unresolvable status or member paths,
    /// conflicting projection).
    pub fn registry(&self) -> Result<ProblemRegistry, ProblemError> {
        let mut builder = ProblemRegistry::builder().logging(self.logging);
        if let Some(mapping) = &self.mapping {
            builder = builder.mapping(mapping.clone());
        }
        if let Some(path) = &self.status_member {
            builder = builder.status_member(path.clone());
        }
        if let Some(members) = &self.public_members {
            builder = builder.public_members(members.clone());
        }
        if let Some(members) = &self.private_members {
            builder = builder.private_members(members.clone());
        }
        builder.build()
    }
}

/// Security settings (`security` section).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SecurityConfig {
    /// Token-validation settings.
    pub auth: AuthConfig,

    /// Cross-origin resource sharing settings.
    pub cors: CorsSettings,

    /// Access-control settings.
    pub access_control: AccessControlSettings,
}

/// Token-validation settings (`security.auth`).
///
/// These values are carried as configuration for the embedding service;
/// FOCA itself only consults `required` to decide whether access control
/// is wired up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AuthConfig {
    /// Whether authenticated access is required.
    pub required: bool,

    /// Accepted token signature algorithms.
    pub algorithms: Vec<String>,

    /// Accepted token audiences.
    pub audience: Option<Vec<String>>,

    /// Accepted token issuers.
    pub issuers: Option<Vec<String>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            required: false,
            algorithms: vec!["RS256".to_string()],
            audience: None,
            issuers: None,
        }
    }
}

/// CORS settings (`security.cors`).
///
/// The defaults are fully permissive with credentials allowed, matching
/// the behavior of an unconfigured service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CorsSettings {
    /// Whether CORS handling is enabled.
    pub enabled: bool,

    /// Allowed origins; `*` allows any origin.
    pub allow_origins: Vec<String>,

    /// Allowed methods; `*` allows any method.
    pub allow_methods: Vec<String>,

    /// Allowed request headers; `*` allows any header.
    pub allow_headers: Vec<String>,

    /// Whether to allow credentials.
    pub allow_credentials: bool,

    /// Response headers exposed to browser scripts.
    pub expose_headers: Vec<String>,

    /// Preflight cache duration in seconds.
    pub max_age_secs: Option<u64>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_origins: vec!["*".to_string()],
            allow_methods: vec!["*".to_string()],
            allow_headers: vec!["*".to_string()],
            allow_credentials: true,
            expose_headers: Vec::new(),
            max_age_secs: Some(86400),
        }
    }
}

/// Access-control settings (`security.access_control`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AccessControlSettings {
    /// Database holding the policy rules. Defaults to `access_control_db`
    /// when access control is registered.
    pub db_name: Option<String>,

    /// Collection holding the policy rules. Defaults to `policy_rules`
    /// when access control is registered.
    pub collection_name: Option<String>,

    /// Path to a Casbin model file overriding the built-in RBAC model.
    pub model_path: Option<String>,

    /// Request headers identifying the resource owner.
    pub owner_headers: Vec<String>,

    /// Request headers identifying the requesting user.
    pub user_headers: Vec<String>,
}

impl Default for AccessControlSettings {
    fn default() -> Self {
        Self {
            db_name: None,
            collection_name: None,
            model_path: None,
            owner_headers: vec!["X-User".to_string(), "X-Group".to_string()],
            user_headers: vec!["X-User".to_string()],
        }
    }
}

impl AccessControlSettings {
    /// Returns whether any access-control setting was explicitly supplied.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.db_name.is_some() || self.collection_name.is_some() || self.model_path.is_some()
    }
}

/// MongoDB settings (`db` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MongoConfig {
    /// MongoDB host.
    pub host: String,

    /// MongoDB port.
    pub port: u16,

    /// Databases to register, keyed by name.
    pub dbs: Option<BTreeMap<String, DbConfig>>,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            host: "mongodb".to_string(),
            port: 27017,
            dbs: None,
        }
    }
}

impl MongoConfig {
    /// Returns the connection URI for the configured host and port.
    #[must_use]
    pub fn connection_uri(&self) -> String {
        format!("mongodb://{}:{}", self.host, self.port)
    }

    /// Registers an additional database, creating the map if needed.
    pub fn add_db(&mut self, name: impl Into<String>, db: DbConfig) {
        self.dbs.get_or_insert_with(BTreeMap::new).insert(name.into(), db);
    }
}

/// Per-database settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DbConfig {
    /// Collections to register, keyed by name.
    pub collections: Option<BTreeMap<String, CollectionConfig>>,
}

impl DbConfig {
    /// Creates a database config with a single collection.
    #[must_use]
    pub fn with_collection(name: impl Into<String>, collection: CollectionConfig) -> Self {
        let mut collections = BTreeMap::new();
        collections.insert(name.into(), collection);
        Self {
            collections: Some(collections),
        }
    }
}

/// Per-collection settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CollectionConfig {
    /// Indexes to create on the collection.
    pub indexes: Option<Vec<IndexConfig>>,
}

/// Index specification for a collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct IndexConfig {
    /// Indexed fields mapped to sort direction (`1` or `-1`).
    pub keys: BTreeMap<String, i32>,

    /// Index options.
    pub options: IndexOptions,
}

/// Options applied when creating an index.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct IndexOptions {
    /// Reject documents duplicating the indexed value.
    pub unique: bool,

    /// Skip documents lacking the indexed field.
    pub sparse: bool,
}

/// Background-task runner settings (`jobs` section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct JobsConfig {
    /// Maximum number of concurrently running tasks.
    pub max_concurrent: usize,

    /// Default per-task timeout in seconds; absent disables timeouts.
    pub timeout_seconds: Option<u64>,

    /// Whether completed tasks are kept in the task registry.
    pub track_history: bool,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 100,
            timeout_seconds: Some(300),
            track_history: true,
        }
    }
}

/// API registration settings (`api` section).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ApiConfig {
    /// OpenAPI specifications to register.
    pub specs: Vec<SpecConfig>,
}

/// A single OpenAPI specification registration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SpecConfig {
    /// Paths to the specification file and any fragments to merge into it.
    pub path: Vec<String>,

    /// Base path prepended to every operation path.
    pub base_path: Option<String>,

    /// Fields added to every operation object.
    pub add_operation_fields: Option<BTreeMap<String, Value>>,

    /// Whether auth requirements in the spec are ignored.
    pub disable_auth: bool,
}
