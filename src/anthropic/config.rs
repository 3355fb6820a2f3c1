//! Anthropic client configuration.

#![allow(clippy::missing_const_for_fn)]

/// Default base URL for Anthropic API.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
/// Default timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;
/// Default model.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
/// Default max tokens. A full component with inline template and styles
/// needs headroom.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
/// Default sampling temperature. Low, since the output must follow a strict
/// format.
pub const DEFAULT_TEMPERATURE: f64 = 0.2;

/// Client configuration for the Anthropic API.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL for the API.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature for sampling.
    pub temperature: Option<f64>,
}

impl ClientConfig {
    /// Create a new client configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set timeout in milliseconds.
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set max tokens.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: Some(DEFAULT_TEMPERATURE),
        }
    }
}
