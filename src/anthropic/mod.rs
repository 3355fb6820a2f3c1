//! Anthropic API client.
//!
//! This module provides:
//! - Direct Claude Messages API integration behind [`GenerationClient`](crate::traits::GenerationClient)
//! - Request validation with size limits
//! - HTTP status classification into [`GenerationError`](crate::error::GenerationError)
//!
//! # Architecture
//!
//! The client uses `reqwest` for HTTP. It issues exactly one request per
//! call; attempt budgeting lives in the [`controller`](crate::controller).
//!
//! # Example
//!
//! ```
//! use component_architect::anthropic::{AnthropicClient, ClientConfig};
//! use component_architect::config::SecretString;
//!
//! let config = ClientConfig::new().with_model("claude-sonnet-4-20250514");
//! let client = AnthropicClient::new(SecretString::new("sk-ant-xxx"), config).unwrap();
//! assert_eq!(client.config().model, "claude-sonnet-4-20250514");
//! ```

mod client;
mod config;
mod types;

pub use client::{AnthropicClient, MAX_PROMPT_BYTES};
pub use config::{
    ClientConfig, DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
    DEFAULT_TIMEOUT_MS,
};
pub use types::{ApiMessage, ApiRequest, ApiResponse, ApiUsage, ContentBlock};
