//! Root configuration type.
//!
//! This module provides the top-level [`AppConfig`] struct binding the
//! whole YAML configuration file, and its builder.

use serde::{Deserialize, Serialize};

use foca_telemetry::LogSettings;

use crate::schema::{
    ApiConfig, ExceptionsConfig, JobsConfig, MongoConfig, SecurityConfig, ServerSettings,
};
use crate::ConfigError;

/// Complete application configuration.
///
/// This is the root configuration type binding every section of the YAML
/// file. Use [`ConfigLoader`](crate::ConfigLoader) to load it from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use foca_config::AppConfig;
///
/// let config = AppConfig::default();
/// assert_eq!(config.server.port, 8080);
/// assert!(config.security.cors.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerSettings,

    /// Problem-mapping settings.
    pub exceptions: ExceptionsConfig,

    /// Security settings (auth, CORS, access control).
    pub security: SecurityConfig,

    /// MongoDB settings; absent disables database support.
    pub db: Option<MongoConfig>,

    /// Background-task runner settings; absent disables task support.
    pub jobs: Option<JobsConfig>,

    /// Logging settings.
    pub log: LogSettings,

    /// API registration settings.
    pub api: ApiConfig,

    /// Free-form configuration for the embedding application.
    pub custom: Option<serde_yaml::Value>,
}

impl AppConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - the bind host is empty
    /// - the log level is not a valid filter directive
    /// - the exceptions section does not build a valid problem registry
    /// - a jobs section configures zero concurrency
    /// - an API spec registration names no file
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.is_empty() {
            return Err(ConfigError::invalid_value(
                "server.host",
                "bind host must not be empty",
            ));
        }

        if foca_telemetry::create_env_filter(&self.log.level).is_err() {
            return Err(ConfigError::invalid_value(
                "log.level",
                format!("invalid filter directive: {}", self.log.level),
            ));
        }

        self.exceptions.registry()?;

        if let Some(jobs) = &self.jobs {
            if jobs.max_concurrent == 0 {
                return Err(ConfigError::invalid_value(
                    "jobs.max_concurrent",
                    "must be greater than zero",
                ));
            }
        }

        for (i, spec) in self.api.specs.iter().enumerate() {
            if spec.path.is_empty() {
                return Err(ConfigError::invalid_value(
                    format!("api.specs[{i}].path"),
                    "at least one specification file is required",
                ));
            }
        }

        Ok(())
    }
}

/// Builder for [`AppConfig`].
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    server: Option<ServerSettings>,
    exceptions: Option<ExceptionsConfig>,
    security: Option<SecurityConfig>,
    db: Option<MongoConfig>,
    jobs: Option<JobsConfig>,
    log: Option<LogSettings>,
    api: Option<ApiConfig>,
}

impl AppConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server settings.
    #[must_use]
    pub fn server(mut self, server: ServerSettings) -> Self {
        self.server = Some(server);
        self
    }

    /// Set the exceptions settings.
    #[must_use]
    pub fn exceptions(mut self, exceptions: ExceptionsConfig) -> Self {
        self.exceptions = Some(exceptions);
        self
    }

    /// Set the security settings.
    #[must_use]
    pub fn security(mut self, security: SecurityConfig) -> Self {
        self.security = Some(security);
        self
    }

    /// Set the database settings.
    #[must_use]
    pub fn db(mut self, db: MongoConfig) -> Self {
        self.db = Some(db);
        self
    }

    /// Set the background-task settings.
    #[must_use]
    pub fn jobs(mut self, jobs: JobsConfig) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Set the logging settings.
    #[must_use]
    pub fn log(mut self, log: LogSettings) -> Self {
        self.log = Some(log);
        self
    }

    /// Set the API registration settings.
    #[must_use]
    pub fn api(mut self, api: ApiConfig) -> Self {
        self.api = Some(api);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections use their default values; `db` and `jobs`
    /// remain absent unless set.
    #[must_use]
    pub fn build(self) -> AppConfig {
        AppConfig {
            server: self.server.unwrap_or_default(),
            exceptions: self.exceptions.unwrap_or_default(),
            security: self.security.unwrap_or_default(),
            db: self.db,
            jobs: self.jobs,
            log: self.log.unwrap_or_default(),
            api: self.api.unwrap_or_default(),
            custom: None,
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<AppConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
