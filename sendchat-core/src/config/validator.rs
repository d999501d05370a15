//! Configuration validation utilities

use super::error::ValidationError;
use super::schema::SendchatConfig;
use super::secrets::is_sensitive_name;
use regex::Regex;
use tracing::warn;
use url::Url;

/// Configuration validator with rules beyond the schema's own checks
pub struct ConfigValidator {
    /// Pattern for leftover environment variable placeholders
    env_var_pattern: Regex,
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidator {
    pub fn new() -> Self {
        Self {
            env_var_pattern: super::env::env_var_pattern().clone(),
        }
    }

    /// Validate a configuration with extended rules
    pub fn validate(&self, config: &SendchatConfig) -> Result<(), ValidationError> {
        config.validate()?;

        self.validate_base_url("batch.base_url", &config.batch.base_url)?;
        self.validate_base_url("streaming.base_url", &config.streaming.base_url)?;
        self.check_extra_headers(config);

        Ok(())
    }

    fn validate_base_url(&self, field: &str, value: &str) -> Result<(), ValidationError> {
        if self.env_var_pattern.is_match(value) {
            return Err(ValidationError::invalid_url(
                field,
                value,
                "unresolved environment variable placeholder",
            ));
        }

        let url =
            Url::parse(value).map_err(|e| ValidationError::invalid_url(field, value, e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ValidationError::invalid_url(
                field,
                value,
                format!("scheme '{other}' is not http or https"),
            )),
        }
    }

    /// Credentials come from the environment, not from extra headers
    fn check_extra_headers(&self, config: &SendchatConfig) {
        for name in config.streaming.extra_headers.keys() {
            if is_sensitive_name(name) {
                warn!(header = %name, "Extra header looks like it carries a credential");
            }
        }
    }

    /// Extract environment variable names from a string
    pub fn extract_env_vars(&self, text: &str) -> Vec<String> {
        self.env_var_pattern
            .captures_iter(text)
            .map(|cap| cap[1].to_string())
            .collect()
    }
}
