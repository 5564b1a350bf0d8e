//! Typed configuration system for FOCA-based services.
//!
//! One YAML file drives the whole service: server binding, problem
//! mapping, security (auth, CORS, access control), MongoDB registration,
//! background tasks, logging, and API registration. This crate binds that
//! file to strongly-typed models with support for:
//! - YAML and JSON configuration files
//! - Deep-merging multiple files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//!
//! # Example
//!
//! ```no_run
//! use foca_config::{AppConfig, ConfigLoader};
//!
//! # fn main() -> Result<(), foca_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("config.yaml")?
//!     .with_env_prefix("FOCA")
//!     .load()?;
//!
//! println!("serving on {}", config.server.bind_addr());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 8080
//!
//! exceptions:
//!   logging: oneline
//!   public_members:
//!     - [title]
//!     - [status]
//!
//! security:
//!   auth:
//!     required: false
//!   cors:
//!     enabled: true
//!
//! db:
//!   host: mongodb
//!   port: 27017
//!   dbs:
//!     petstore:
//!       collections:
//!         pets:
//!           indexes:
//!             - keys:
//!                 id: 1
//!               options:
//!                 unique: true
//!
//! jobs:
//!   max_concurrent: 100
//!   timeout_seconds: 300
//!
//! log:
//!   level: info
//!   format: pretty
//!
//! api:
//!   specs:
//!     - path: [petstore.yaml]
//!       base_path: /v1
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden via environment variables using the format
//! `PREFIX__SECTION__KEY`, e.g.:
//!
//! - `FOCA__SERVER__PORT=9090`
//! - `FOCA__LOG__LEVEL=debug`
//! - `FOCA__SECURITY__AUTH__REQUIRED=true`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{AppConfig, AppConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_addr(), "0.0.0.0:8080");
        assert!(config.security.cors.enabled);
        assert!(!config.security.auth.required);
    }

    #[test]
    fn test_full_yaml_document() {
        let yaml = r"
            server:
              host: 0.0.0.0
              port: 8080
            exceptions:
              logging: minimal
            security:
              auth:
                required: true
              access_control:
                db_name: access_control_db
                collection_name: policy_rules
            db:
              host: mongodb
              port: 27017
              dbs:
                petstore:
                  collections:
                    pets:
                      indexes:
                        - keys:
                            id: 1
            jobs:
              max_concurrent: 10
            log:
              level: info
            api:
              specs:
                - path: [petstore.yaml]
        ";

        let config = ConfigLoader::new()
            .with_string(yaml, "yaml")
            .unwrap()
            .load()
            .unwrap();

        assert!(config.security.auth.required);
        assert!(config.security.access_control.is_configured());
        assert_eq!(config.jobs.unwrap().max_concurrent, 10);
        assert_eq!(config.api.specs.len(), 1);
        assert_eq!(
            config.exceptions.logging,
            foca_core::ProblemLogFormat::Minimal
        );
    }
}
