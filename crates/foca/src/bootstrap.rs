//! Service bootstrap.
//!
//! The [`Foca`] type owns the parsed application configuration and sets up
//! each component in a fixed order. Every step is logged, and components
//! whose configuration sections are absent are skipped with a log line
//! rather than an error.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info};

use foca_authz::{register_access_control, AccessControl, AccessControlStage};
use foca_config::{AppConfig, ConfigError, ConfigLoader};
use foca_core::ProblemError;
use foca_db::{DbError, MongoRegistry};
use foca_middleware::stages::{CorsStage, RequestIdStage, TrafficStage};
use foca_server::{App, AppBuilder};
use foca_tasks::TaskRunner;
use foca_telemetry::init_logging;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "FOCA";

/// Errors that can occur during service bootstrap.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Configuration could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The problem registry could not be built.
    #[error(transparent)]
    Problems(#[from] ProblemError),

    /// Database registration failed.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Access-control registration failed.
    #[error(transparent)]
    Authz(#[from] foca_authz::AuthzError),

    /// A component requires a configuration section that is absent.
    #[error("no support for {component} configured, add the '{section}' section to the configuration")]
    MissingSection {
        /// The component that cannot be created.
        component: &'static str,
        /// The configuration section it requires.
        section: &'static str,
    },
}

/// Configuration-driven service bootstrap.
///
/// # Example
///
/// ```
/// use foca::Foca;
///
/// let foca = Foca::new(None).expect("default configuration is valid");
/// assert_eq!(foca.config().server.port, 8080);
/// ```
pub struct Foca {
    config: AppConfig,
}

impl Foca {
    /// Creates a bootstrap from a configuration file.
    ///
    /// With `None`, the built-in defaults are used. Environment overrides
    /// with the `FOCA` prefix apply in both cases. Logging is configured
    /// as part of construction.
    ///
    /// # Errors
    ///
    /// Returns `BootstrapError::Config` when the file cannot be parsed or
    /// the configuration is invalid.
    pub fn new(config_file: Option<&Path>) -> Result<Self, BootstrapError> {
        let mut loader = ConfigLoader::new().with_defaults();
        if let Some(path) = config_file {
            loader = loader.with_file(path)?;
        }
        let config = loader.with_env_prefix(ENV_PREFIX).load()?;

        init_logging(&config.log);
        info!("log formatting configured");

        match config_file {
            Some(path) => info!(path = %path.display(), "configuration file parsed"),
            None => info!("default app configuration used"),
        }

        Ok(Self { config })
    }

    /// Creates a bootstrap from an already-built configuration.
    ///
    /// # Errors
    ///
    /// Returns `BootstrapError::Config` when the configuration is invalid.
    pub fn from_config(config: AppConfig) -> Result<Self, BootstrapError> {
        config.validate()?;
        init_logging(&config.log);
        Ok(Self { config })
    }

    /// Returns the application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Sets up the application builder: problem registry, CORS, request
    /// IDs, and traffic logging, in that order.
    ///
    /// The caller registers its operations on the returned builder and
    /// calls `build()`.
    ///
    /// # Errors
    ///
    /// Returns `BootstrapError::Problems` when the exceptions section is
    /// inconsistent.
    pub fn create_app(&self) -> Result<AppBuilder, BootstrapError> {
        let problems = self.config.exceptions.registry()?;

        let mut builder = App::builder()
            .settings(self.config.server.clone())
            .problems(problems);

        let cors = &self.config.security.cors;
        if cors.enabled {
            builder = builder.stage(Arc::new(CorsStage::from_lists(
                &cors.allow_origins,
                &cors.allow_methods,
                &cors.allow_headers,
                &cors.expose_headers,
                cors.allow_credentials,
                cors.max_age_secs.map(Duration::from_secs),
            )));
            info!("CORS enabled");
        } else {
            info!("CORS disabled");
        }

        builder = builder
            .stage(Arc::new(RequestIdStage::new()))
            .stage(Arc::new(TrafficStage::new()));

        for spec in &self.config.api.specs {
            info!(paths = ?spec.path, base_path = ?spec.base_path, "API specification registered");
        }
        if self.config.api.specs.is_empty() {
            info!("no API specifications provided");
        }

        Ok(builder)
    }

    /// Registers MongoDB from the `db` section.
    ///
    /// Returns `None` when no database is configured.
    ///
    /// # Errors
    ///
    /// Returns `BootstrapError::Db` on registration failure.
    pub async fn create_db(&self) -> Result<Option<MongoRegistry>, BootstrapError> {
        match &self.config.db {
            Some(conf) => {
                let registry = foca_db::register_mongodb(conf).await?;
                info!("database registered");
                Ok(Some(registry))
            }
            None => {
                info!("no database support configured");
                Ok(None)
            }
        }
    }

    /// Registers access control when authentication is required.
    ///
    /// Ensures the access-control database and collection exist in the
    /// registry (and in the `db` configuration section), builds the
    /// enforcer, and returns the handle. When authentication is not
    /// required, returns `None`; if access-control settings were supplied
    /// anyway, an error is logged, matching the bootstrap behavior of an
    /// unconfigured security section.
    ///
    /// # Errors
    ///
    /// Returns `BootstrapError::Authz` on registration failure.
    pub async fn create_access_control(
        &mut self,
        registry: &mut MongoRegistry,
    ) -> Result<Option<AccessControl>, BootstrapError> {
        if !self.config.security.auth.required {
            if self.config.security.access_control.is_configured() {
                error!("please enable security config to register access control");
            }
            return Ok(None);
        }

        let mut db_conf = self.config.db.take().unwrap_or_default();
        let access = register_access_control(
            registry,
            &mut db_conf,
            &self.config.security.access_control,
        )
        .await?;
        self.config.db = Some(db_conf);

        info!("access control registered");
        Ok(Some(access))
    }

    /// Builds the enforcement middleware stage for a registered
    /// access-control handle.
    ///
    /// # Errors
    ///
    /// Returns `BootstrapError::Problems` when the exceptions section is
    /// inconsistent.
    pub fn access_control_stage(
        &self,
        access: Arc<AccessControl>,
    ) -> Result<AccessControlStage, BootstrapError> {
        let problems = Arc::new(self.config.exceptions.registry()?);
        Ok(AccessControlStage::new(
            access,
            problems,
            self.config.security.access_control.user_headers.clone(),
        ))
    }

    /// Creates the background task runner from the `jobs` section.
    ///
    /// # Errors
    ///
    /// Returns `BootstrapError::MissingSection` when no `jobs` section is
    /// configured.
    pub fn create_task_runner(&self) -> Result<TaskRunner, BootstrapError> {
        let jobs = self
            .config
            .jobs
            .as_ref()
            .ok_or(BootstrapError::MissingSection {
                component: "background tasks",
                section: "jobs",
            })?;

        let runner = TaskRunner::from_config(jobs);
        info!("support for background tasks set up");
        Ok(runner)
    }
}
