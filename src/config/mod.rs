//! Configuration management.
//!
//! This module handles:
//! - Environment variable loading
//! - Configuration validation
//! - Default value handling
//! - Secure API key storage via [`SecretString`]
//!
//! # Example
//!
//! ```
//! use component_architect::config::{Config, SecretString};
//!
//! // Create a config directly (use Config::from_env() in production)
//! let config = Config::with_api_key(SecretString::new("sk-ant-example-key"));
//!
//! assert_eq!(config.max_attempts(), 4);
//! // API key is protected from accidental logging
//! let debug = format!("{:?}", config);
//! assert!(debug.contains("<REDACTED>"));
//! assert!(!debug.contains("sk-ant-example-key"));
//! ```

mod secret;
mod validation;

pub use secret::SecretString;
pub use validation::{
    validate_config, validate_settings, MAX_INPUT_CHARS_LIMIT, MAX_RETRIES, MAX_TIMEOUT_MS, MIN_TIMEOUT_MS,
};

use std::time::Duration;

use crate::anthropic::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::controller::{ControllerConfig, TransportFailurePolicy};
use crate::error::ConfigError;
use crate::sanitizer::DEFAULT_MAX_CHARS;

/// Default design-token document path.
pub const DEFAULT_DESIGN_SYSTEM_PATH: &str = "./design-system.json";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Application configuration.
///
/// Use [`Config::from_env`] to load configuration from environment variables.
/// The model name and every limit live here and are handed to the components
/// at construction; nothing reads them from process-wide state afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Anthropic API key (protected from logging via [`SecretString`]).
    pub api_key: SecretString,
    /// Base URL of the Messages API.
    pub base_url: String,
    /// Model to use.
    pub model: String,
    /// Path of the design-token JSON document.
    pub design_system_path: String,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: String,
    /// Per-call timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Sanitizer character limit.
    pub max_input_chars: usize,
    /// What a transport failure does to the session.
    pub transport_failure_policy: TransportFailurePolicy,
    /// Whether the unsafe-API rule is registered.
    pub security_rules: bool,
    /// Origins `fetch` may target when security rules are on.
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Build a configuration with defaults for everything but the key.
    #[must_use]
    pub fn with_api_key(api_key: SecretString) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            design_system_path: DEFAULT_DESIGN_SYSTEM_PATH.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            max_input_chars: DEFAULT_MAX_CHARS,
            transport_failure_policy: TransportFailurePolicy::default(),
            security_rules: false,
            allowed_origins: Vec::new(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `ANTHROPIC_API_KEY`: Anthropic API key
    ///
    /// Optional environment variables (with defaults):
    /// - `ANTHROPIC_BASE_URL`: API base (default: `https://api.anthropic.com/v1`)
    /// - `ANTHROPIC_MODEL`: Model to use (default: `claude-sonnet-4-20250514`)
    /// - `DESIGN_SYSTEM_PATH`: Token document (default: `./design-system.json`)
    /// - `LOG_LEVEL`: Logging level (default: `info`)
    /// - `REQUEST_TIMEOUT_MS`: Per-call timeout (default: `60000`)
    /// - `MAX_RETRIES`: Retries after the first attempt (default: `3`)
    /// - `MAX_INPUT_CHARS`: Sanitizer limit (default: `1000`)
    /// - `TRANSPORT_FAILURE_POLICY`: `consume` or `fatal` (default: `consume`)
    /// - `SECURITY_RULES`: Enable the unsafe-API rule (default: `false`)
    /// - `ALLOWED_ORIGINS`: Comma-separated `fetch` allow-list
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `ANTHROPIC_API_KEY` is missing, a value does
    /// not parse, or any value fails validation (see [`validate_config`]).
    #[must_use = "configuration should be used"]
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let api_key =
            std::env::var("ANTHROPIC_API_KEY").map_err(|_| ConfigError::MissingRequired {
                var: "ANTHROPIC_API_KEY".into(),
            })?;

        let config = Self::with_api_key(SecretString::new(api_key)).apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load every setting except the API key, for commands that never call
    /// the API (`validate`) and for logging setup before any command runs.
    ///
    /// The key is taken from `ANTHROPIC_API_KEY` when present and left empty
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a value does not parse or fails
    /// [`validate_settings`].
    pub fn from_env_without_key() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let api_key = std::env::var("ANTHROPIC_API_KEY").unwrap_or_default();
        let config = Self::with_api_key(SecretString::new(api_key)).apply_env()?;
        validate_settings(&config)?;
        Ok(config)
    }

    fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(base_url) = std::env::var("ANTHROPIC_BASE_URL") {
            self.base_url = base_url;
        }
        if let Ok(model) = std::env::var("ANTHROPIC_MODEL") {
            self.model = model;
        }
        if let Ok(path) = std::env::var("DESIGN_SYSTEM_PATH") {
            self.design_system_path = path;
        }
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.log_level = level;
        }

        self.request_timeout_ms = parse_env_u64("REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?;
        self.max_retries = parse_env_u32("MAX_RETRIES", DEFAULT_MAX_RETRIES)?;
        self.max_input_chars = usize::try_from(parse_env_u64(
            "MAX_INPUT_CHARS",
            DEFAULT_MAX_CHARS as u64,
        )?)
        .map_err(|_| ConfigError::InvalidValue {
            var: "MAX_INPUT_CHARS".into(),
            reason: "does not fit in memory".into(),
        })?;

        if let Ok(policy) = std::env::var("TRANSPORT_FAILURE_POLICY") {
            self.transport_failure_policy =
                policy.parse().map_err(|()| ConfigError::InvalidValue {
                    var: "TRANSPORT_FAILURE_POLICY".into(),
                    reason: "must be `consume` or `fatal`".into(),
                })?;
        }

        self.security_rules = parse_env_bool("SECURITY_RULES", false)?;
        self.allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or_default();
        Ok(self)
    }

    /// Apply command-line security flags on top of the environment.
    ///
    /// `force` turns the unsafe-API rule on; it is never turned off here.
    /// `extra_origins` are added to the allow-list.
    #[must_use]
    pub fn with_security_overrides(mut self, force: bool, extra_origins: Vec<String>) -> Self {
        self.security_rules |= force;
        for origin in extra_origins {
            let origin = origin.trim().trim_end_matches('/').to_string();
            if !origin.is_empty() && !self.allowed_origins.contains(&origin) {
                self.allowed_origins.push(origin);
            }
        }
        self
    }

    /// Total generation calls a session may issue.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Settings for the HTTP generation client.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new()
            .with_base_url(&self.base_url)
            .with_model(&self.model)
            .with_timeout_ms(self.request_timeout_ms)
    }

    /// Settings for the retry controller.
    #[must_use]
    pub const fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            max_attempts: self.max_attempts(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            max_input_chars: self.max_input_chars,
            transport_failure_policy: self.transport_failure_policy,
        }
    }
}

/// Parse an environment variable as u64, using a default if not set.
fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    std::env::var(name).map_or(Ok(default), |val| {
        val.parse().map_err(|_| ConfigError::InvalidValue {
            var: name.into(),
            reason: "must be a positive integer".into(),
        })
    })
}

/// Parse an environment variable as u32, using a default if not set.
fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    std::env::var(name).map_or(Ok(default), |val| {
        val.parse().map_err(|_| ConfigError::InvalidValue {
            var: name.into(),
            reason: "must be a positive integer".into(),
        })
    })
}

/// Parse an environment variable as a boolean flag.
fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    std::env::var(name).map_or(Ok(default), |val| {
        match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                var: name.into(),
                reason: "must be true or false".into(),
            }),
        }
    })
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect()
}
