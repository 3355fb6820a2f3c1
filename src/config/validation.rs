//! Configuration validation.
//!
//! Range checks applied once at startup, before any session runs.

use super::Config;
use crate::error::ConfigError;

/// Minimum allowed timeout in milliseconds (1 second).
pub const MIN_TIMEOUT_MS: u64 = 1000;

/// Maximum allowed timeout in milliseconds (5 minutes).
pub const MAX_TIMEOUT_MS: u64 = 300_000;

/// Maximum allowed retry count.
pub const MAX_RETRIES: u32 = 10;

/// Largest sanitizer limit accepted.
pub const MAX_INPUT_CHARS_LIMIT: usize = 20_000;

/// Validate configuration values.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] if any value is out of range:
/// - `ANTHROPIC_API_KEY` must not be blank
/// - `REQUEST_TIMEOUT_MS` must be between 1000 and 300000
/// - `MAX_RETRIES` must be between 0 and 10
/// - `MAX_INPUT_CHARS` must be between 1 and 20000
/// - `ANTHROPIC_MODEL` must not be blank
/// - every `ALLOWED_ORIGINS` entry must be an `http(s)://` origin
#[must_use = "validation result should be checked"]
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.api_key.is_blank() {
        return Err(ConfigError::InvalidValue {
            var: "ANTHROPIC_API_KEY".into(),
            reason: "must not be empty".into(),
        });
    }
    validate_settings(config)
}

/// Validate everything [`validate_config`] does except the API key.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for the first out-of-range value.
#[must_use = "validation result should be checked"]
pub fn validate_settings(config: &Config) -> Result<(), ConfigError> {
    if config.request_timeout_ms < MIN_TIMEOUT_MS || config.request_timeout_ms > MAX_TIMEOUT_MS {
        return Err(ConfigError::InvalidValue {
            var: "REQUEST_TIMEOUT_MS".into(),
            reason: format!("must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS} ms"),
        });
    }

    if config.max_retries > MAX_RETRIES {
        return Err(ConfigError::InvalidValue {
            var: "MAX_RETRIES".into(),
            reason: format!("must be between 0 and {MAX_RETRIES}"),
        });
    }

    if config.max_input_chars == 0 || config.max_input_chars > MAX_INPUT_CHARS_LIMIT {
        return Err(ConfigError::InvalidValue {
            var: "MAX_INPUT_CHARS".into(),
            reason: format!("must be between 1 and {MAX_INPUT_CHARS_LIMIT}"),
        });
    }

    if config.model.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            var: "ANTHROPIC_MODEL".into(),
            reason: "must not be empty".into(),
        });
    }

    if let Some(bad) = config
        .allowed_origins
        .iter()
        .find(|o| !(o.starts_with("https://") || o.starts_with("http://")))
    {
        return Err(ConfigError::InvalidValue {
            var: "ALLOWED_ORIGINS".into(),
            reason: format!("`{bad}` is not an http(s) origin"),
        });
    }

    Ok(())
}
