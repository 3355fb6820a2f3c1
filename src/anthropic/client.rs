//! Anthropic API client.
//!
//! This module provides:
//! - HTTP client for the Anthropic Messages API
//! - Request validation
//! - Status classification into [`GenerationError`]
//! - Response parsing
//!
//! Every call is a single HTTP request. Retrying is the retry controller's
//! job, so a rate limit or overload surfaces immediately.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::uninlined_format_args)]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::config::ClientConfig;
use super::types::{ApiMessage, ApiRequest, ApiResponse};
use crate::config::SecretString;
use crate::error::GenerationError;
use crate::traits::GenerationClient;

/// Maximum prompt length in bytes (100KB).
pub const MAX_PROMPT_BYTES: usize = 100_000;

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Fallback wait when a 429 carries no usable `retry-after`.
const DEFAULT_RETRY_AFTER_SECONDS: u64 = 60;

/// Anthropic API client.
#[derive(Debug)]
pub struct AnthropicClient {
    client: Client,
    api_key: SecretString,
    config: ClientConfig,
}

impl AnthropicClient {
    /// Create a new Anthropic client.
    pub fn new(api_key: SecretString, config: ClientConfig) -> Result<Self, GenerationError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let client =
            Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| GenerationError::Network {
                    message: format!("Failed to create HTTP client: {e}"),
                })?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    /// Create a client with default configuration.
    pub fn with_api_key(api_key: impl Into<SecretString>) -> Result<Self, GenerationError> {
        Self::new(api_key.into(), ClientConfig::default())
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Get the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the request for one generation call.
    fn build_request(&self, system: String, prompt: String) -> ApiRequest {
        let request = ApiRequest::new(
            &self.config.model,
            self.config.max_tokens,
            vec![ApiMessage::user(prompt)],
        )
        .with_system(system);

        match self.config.temperature {
            Some(t) => request.with_temperature(t),
            None => request,
        }
    }

    /// Validate request size limits.
    fn validate_request(request: &ApiRequest) -> Result<(), GenerationError> {
        let size: usize = request
            .messages
            .iter()
            .map(|m| m.content.len())
            .chain(request.system.iter().map(String::len))
            .sum();

        if size > MAX_PROMPT_BYTES {
            return Err(GenerationError::InvalidRequest {
                message: format!("Prompt too large: {} > {}", size, MAX_PROMPT_BYTES),
            });
        }

        Ok(())
    }

    /// Execute a single request.
    async fn execute_once(&self, request: &ApiRequest) -> Result<String, GenerationError> {
        let url = format!("{}/messages", self.config.base_url);
        let start = std::time::Instant::now();

        tracing::debug!(
            url = %url,
            model = %request.model,
            max_tokens = request.max_tokens,
            timeout_ms = self.config.timeout_ms,
            "Starting Anthropic API request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let elapsed_ms = start.elapsed().as_millis();
                if e.is_timeout() {
                    tracing::error!(
                        url = %url,
                        elapsed_ms = elapsed_ms,
                        timeout_ms = self.config.timeout_ms,
                        "Anthropic API request timed out"
                    );
                    GenerationError::Timeout {
                        timeout_ms: self.config.timeout_ms,
                    }
                } else {
                    tracing::error!(
                        url = %url,
                        elapsed_ms = elapsed_ms,
                        error = %e,
                        "Anthropic API request failed"
                    );
                    GenerationError::Network {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        tracing::debug!(
            url = %url,
            status = %status,
            elapsed_ms = start.elapsed().as_millis(),
            "Anthropic API response received"
        );

        match status.as_u16() {
            401 | 403 => return Err(GenerationError::AuthenticationFailed),
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECONDS);
                return Err(GenerationError::RateLimited {
                    retry_after_seconds: retry_after,
                });
            }
            529 => {
                return Err(GenerationError::ModelOverloaded {
                    model: request.model.clone(),
                })
            }
            _ => {}
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::UnexpectedResponse {
                message: format!("Status {}: {}", status, body),
            });
        }

        let body: ApiResponse =
            response
                .json()
                .await
                .map_err(|e| GenerationError::UnexpectedResponse {
                    message: format!("Failed to parse response: {e}"),
                })?;

        Self::parse_response(&body)
    }

    /// Extract the generated text, rejecting blank output.
    fn parse_response(response: &ApiResponse) -> Result<String, GenerationError> {
        let text = response.text();
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        tracing::debug!(
            message_id = %response.id,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = ?response.stop_reason,
            "Generation complete"
        );

        Ok(text)
    }
}

#[async_trait]
impl GenerationClient for AnthropicClient {
    async fn generate(&self, system: String, prompt: String) -> Result<String, GenerationError> {
        let request = self.build_request(system, prompt);
        Self::validate_request(&request)?;
        self.execute_once(&request).await
    }
}
