//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, one or more YAML/JSON files, and environment
//! variables.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use serde_yaml::Value;

use crate::{AppConfig, ConfigError};

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file(s) (YAML or JSON; multiple files deep-merge)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use foca_config::ConfigLoader;
///
/// # fn main() -> Result<(), foca_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_file("config.yaml")?
///     .with_env_prefix("FOCA")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: AppConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            env_prefix: None,
        }
    }

    /// Start with default configuration values.
    ///
    /// This is called automatically by `new()`, but can be chained for
    /// clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = AppConfig::default();
        self
    }

    /// Load configuration from a file.
    ///
    /// Supports YAML (`.yaml`, `.yml`) and JSON (`.json`) formats, chosen
    /// by file extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist or cannot be read
    /// - The file contains invalid YAML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from an optional file.
    ///
    /// If the file exists, loads it. If not, silently continues with the
    /// current values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Parse and deep-merge a set of YAML files.
    ///
    /// Merging is done iteratively from the first to the last argument.
    /// Mapping values are updated recursively; scalars and sequences in
    /// later files replace earlier ones.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any file cannot be read or parsed, or if
    /// the merged document does not bind to the configuration model.
    pub fn merge_files<P: AsRef<Path>>(mut self, paths: &[P]) -> Result<Self, ConfigError> {
        let mut merged = Value::Null;

        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                return Err(ConfigError::file_not_found(path));
            }
            let content =
                fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
            let value: Value = serde_yaml::from_str(&content)?;
            merge_values(&mut merged, value);
        }

        if !matches!(merged, Value::Null) {
            self.config = serde_yaml::from_value(merged)?;
        }

        Ok(self)
    }

    /// Load configuration from a string.
    ///
    /// # Arguments
    ///
    /// * `content` - Configuration content
    /// * `format` - `yaml` or `json`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use foca_config::ConfigLoader;
    ///
    /// let yaml = r"
    ///     server:
    ///       port: 9090
    /// ";
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(yaml, "yaml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.port, 9090);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "yaml" | "yml" => serde_yaml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`, e.g.
    /// with prefix `FOCA`:
    /// - `FOCA__SERVER__PORT=9090`
    /// - `FOCA__LOG__LEVEL=debug`
    /// - `FOCA__SECURITY__AUTH__REQUIRED=true`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file for environment variables.
    ///
    /// A missing file is ignored.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        let _ = dotenvy::dotenv();
        self
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if environment parsing or validation fails.
    pub fn load(mut self) -> Result<AppConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without validation.
    ///
    /// Use this to inspect or modify the configuration before validating.
    #[must_use]
    pub fn load_unvalidated(self) -> AppConfig {
        self.config
    }

    // Parse configuration file based on extension
    fn parse_file(content: &str, path: &Path) -> Result<AppConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("yaml" | "yml") => Ok(serde_yaml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    // Apply environment variable overrides
    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let env_vars: HashMap<String, String> = env::vars()
            .filter(|(k, _)| k.starts_with(prefix))
            .collect();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    // Apply a single environment variable
    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();

        match parts.as_slice() {
            // Server section
            ["SERVER", "HOST"] => {
                self.config.server.host = value.to_string();
            }
            ["SERVER", "PORT"] => {
                self.config.server.port = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["SERVER", "DEBUG"] => {
                self.config.server.debug = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["SERVER", "ENVIRONMENT"] => {
                self.config.server.environment = value.to_string();
            }
            ["SERVER", "REQUEST_TIMEOUT_SECS"] => {
                self.config.server.request_timeout_secs = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                self.config.server.shutdown_timeout_secs = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }

            // Log section
            ["LOG", "LEVEL"] => {
                self.config.log.level = value.to_string();
            }
            ["LOG", "FORMAT"] => {
                self.config.log.format = match value.to_lowercase().as_str() {
                    "json" => foca_telemetry::LogOutputFormat::Json,
                    "pretty" => foca_telemetry::LogOutputFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOG", "ANSI"] => {
                self.config.log.ansi = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            // Database section
            ["DB", "HOST"] => {
                let db = self.config.db.get_or_insert_with(Default::default);
                db.host = value.to_string();
            }
            ["DB", "PORT"] => {
                let db = self.config.db.get_or_insert_with(Default::default);
                db.port = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }

            // Jobs section
            ["JOBS", "MAX_CONCURRENT"] => {
                let jobs = self.config.jobs.get_or_insert_with(Default::default);
                jobs.max_concurrent = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["JOBS", "TIMEOUT_SECONDS"] => {
                let jobs = self.config.jobs.get_or_insert_with(Default::default);
                jobs.timeout_seconds = if value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(value.parse().map_err(|_| {
                        ConfigError::env_parse_error(key, "expected integer or 'none'")
                    })?)
                };
            }

            // Security section
            ["SECURITY", "AUTH", "REQUIRED"] => {
                self.config.security.auth.required = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["SECURITY", "CORS", "ENABLED"] => {
                self.config.security.cors.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            // Exceptions section
            ["EXCEPTIONS", "LOGGING"] => {
                self.config.exceptions.logging = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected log format"))?;
            }

            // Unknown key - ignore
            _ => {}
        }

        Ok(())
    }
}

/// Deep-merge `other` into `base`.
///
/// Mapping entries are merged recursively; any other value in `other`
/// replaces the corresponding value in `base`.
fn merge_values(base: &mut Value, other: Value) {
    match (base, other) {
        (Value::Mapping(base_map), Value::Mapping(other_map)) => {
            for (key, value) in other_map {
                if let Some(existing) = base_map.get_mut(&key) {
                    merge_values(existing, value);
                } else {
                    base_map.insert(key, value);
                }
            }
        }
        (base, other) => {
            *base = other;
        }
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_loader_with_string_yaml() {
        let yaml = r"
            server:
              host: 127.0.0.1
              port: 9090
        ";
        let config = ConfigLoader::new()
            .with_string(yaml, "yaml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"server": {"port": 9090}}"#;
        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn test_loader_with_string_unknown_format() {
        assert!(ConfigLoader::new().with_string("{}", "toml").is_err());
    }

    #[test]
    fn test_loader_with_file_not_found() {
        assert!(ConfigLoader::new()
            .with_file("/nonexistent/config.yaml")
            .is_err());
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/config.yaml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_loader_with_file_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "server:\n  port: 7070").unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.server.port, 7070);
    }

    #[test]
    fn test_loader_with_file_unsupported_extension() {
        let mut file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        writeln!(file, "port=7070").unwrap();

        assert!(ConfigLoader::new().with_file(file.path()).is_err());
    }

    #[test]
    fn test_loader_rejects_unknown_section() {
        let yaml = "unknown_section:\n  key: value\n";
        assert!(ConfigLoader::new().with_string(yaml, "yaml").is_err());
    }

    #[test]
    fn test_merge_files_updates_nested_keys() {
        let mut base = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            base,
            "server:\n  host: 127.0.0.1\n  port: 7070\nlog:\n  level: debug"
        )
        .unwrap();

        let mut overlay = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(overlay, "server:\n  port: 9090").unwrap();

        let config = ConfigLoader::new()
            .merge_files(&[base.path(), overlay.path()])
            .unwrap()
            .load()
            .unwrap();

        // The overlay replaces the port but keeps the host and log level.
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_merge_files_empty_list_keeps_defaults() {
        let config = ConfigLoader::new()
            .merge_files::<&str>(&[])
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_apply_env_var_server() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("FOCA__SERVER__HOST", "192.168.1.1", "FOCA")
            .unwrap();
        loader
            .apply_env_var("FOCA__SERVER__PORT", "9000", "FOCA")
            .unwrap();
        assert_eq!(loader.config.server.host, "192.168.1.1");
        assert_eq!(loader.config.server.port, 9000);
    }

    #[test]
    fn test_apply_env_var_log() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("FOCA__LOG__LEVEL", "debug", "FOCA")
            .unwrap();
        loader
            .apply_env_var("FOCA__LOG__FORMAT", "json", "FOCA")
            .unwrap();
        assert_eq!(loader.config.log.level, "debug");
        assert_eq!(
            loader.config.log.format,
            foca_telemetry::LogOutputFormat::Json
        );
    }

    #[test]
    fn test_apply_env_var_creates_db_section() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("FOCA__DB__HOST", "localhost", "FOCA")
            .unwrap();
        assert_eq!(loader.config.db.as_ref().unwrap().host, "localhost");
        // Port keeps its default
        assert_eq!(loader.config.db.as_ref().unwrap().port, 27017);
    }

    #[test]
    fn test_apply_env_var_auth_required() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("FOCA__SECURITY__AUTH__REQUIRED", "true", "FOCA")
            .unwrap();
        assert!(loader.config.security.auth.required);
    }

    #[test]
    fn test_apply_env_var_exceptions_logging() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("FOCA__EXCEPTIONS__LOGGING", "minimal", "FOCA")
            .unwrap();
        assert_eq!(
            loader.config.exceptions.logging,
            foca_core::ProblemLogFormat::Minimal
        );
    }

    #[test]
    fn test_apply_env_var_invalid_integer() {
        let mut loader = ConfigLoader::new();
        assert!(loader
            .apply_env_var("FOCA__SERVER__PORT", "lots", "FOCA")
            .is_err());
    }

    #[test]
    fn test_apply_env_var_unknown_key_ignored() {
        let mut loader = ConfigLoader::new();
        assert!(loader
            .apply_env_var("FOCA__NOT__A__KEY", "whatever", "FOCA")
            .is_ok());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_merge_values_scalar_replacement() {
        let mut base: Value = serde_yaml::from_str("a: 1\nb: [1, 2]").unwrap();
        let other: Value = serde_yaml::from_str("b: [3]").unwrap();
        merge_values(&mut base, other);

        let expected: Value = serde_yaml::from_str("a: 1\nb: [3]").unwrap();
        assert_eq!(base, expected);
    }
}
