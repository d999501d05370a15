//! Configuration for the dispatcher and its providers
//!
//! Configuration files are YAML or JSON. `${VAR}` placeholders are replaced
//! from the environment before parsing, then the result is validated.
//! Credentials are never part of the file; they come from the environment at
//! call time.

mod env;
mod error;
mod schema;
mod secrets;
mod validator;

pub use env::interpolate_env_vars;
pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{
    expand_home, BatchConfig, CacheBackend, CacheConfig, SendchatConfig, StreamingConfig,
    CONFIG_VERSION, DEFAULT_CACHE_PATH,
};
pub use secrets::{is_sensitive_name, SafeLogging, SecretString};
pub use validator::ConfigValidator;

use std::fs;
use std::path::Path;

fn read_interpolated(path: &Path) -> ConfigResult<String> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    interpolate_env_vars(&content)
}

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<SendchatConfig> {
    let path = path.as_ref();
    let interpolated = read_interpolated(path)?;

    let config: SendchatConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::Syntax {
            path: path.to_string_lossy().to_string(),
            format: "YAML",
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    ConfigValidator::new().validate(&config)?;
    Ok(config)
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<SendchatConfig> {
    let path = path.as_ref();
    let interpolated = read_interpolated(path)?;

    let config: SendchatConfig =
        serde_json::from_str(&interpolated).map_err(|e| ConfigError::Syntax {
            path: path.to_string_lossy().to_string(),
            format: "JSON",
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;

    ConfigValidator::new().validate(&config)?;
    Ok(config)
}

/// Load a configuration, picking the format from the file extension
pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<SendchatConfig> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_from_json(path),
        _ => load_from_yaml(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_yaml() {
        let yaml = r#"
version: "0.1"
retry:
  max_attempts: 3
  initial_delay_ms: 10
cache:
  enabled: true
  max_entries: 100
"#;
        let config: SendchatConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.exponential_base, 2.0);
        assert!(config.cache.enabled);
        assert_eq!(config.cache.max_entries, Some(100));
        assert_eq!(config.streaming.max_tokens_to_sample, 90_000);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "version: \"0.1\"\nproviders: []\n";
        assert!(serde_yaml::from_str::<SendchatConfig>(yaml).is_err());
    }
}
