//! Error types for the component architect.
//!
//! This module defines a hierarchical error system:
//! - [`AppError`]: Top-level application errors
//! - [`GenerationError`]: Failures of the remote generation call
//! - [`SessionError`]: Preconditions rejected before a session starts
//! - [`ConfigError`]: Configuration and design-token loading errors
//!
//! Validation findings are not errors: they are data returned by the
//! [`Validator`](crate::validator::Validator) and consumed by the retry loop.
//!
//! All errors implement `Send + Sync` for async compatibility.

use serde::Serialize;
use thiserror::Error;

/// Top-level application error.
///
/// This is the error type returned by the binary and by helpers that touch
/// the filesystem. It wraps all subsystem errors for unified error handling.
#[derive(Debug, Error)]
pub enum AppError {
    /// Generation API error.
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Session precondition error.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Generation call failures.
///
/// These represent failures of a single call to the text-generation backend.
/// The client never retries; the retry controller decides what happens next.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationError {
    /// Authentication failed due to invalid API key.
    #[error("Authentication failed: invalid API key")]
    AuthenticationFailed,

    /// Request was rate limited or the quota is exhausted.
    #[error("Rate limited: retry after {retry_after_seconds}s")]
    RateLimited {
        /// Seconds the backend asked us to wait.
        retry_after_seconds: u64,
    },

    /// The requested model is overloaded.
    #[error("Model overloaded: {model}")]
    ModelOverloaded {
        /// The model that is overloaded.
        model: String,
    },

    /// Request timed out.
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Network communication error.
    #[error("Network error: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },

    /// The backend answered, but with no usable text.
    #[error("Empty response from generation backend")]
    EmptyResponse,

    /// Invalid request parameters.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of what's invalid.
        message: String,
    },

    /// Unexpected response from the API.
    #[error("Unexpected response: {message}")]
    UnexpectedResponse {
        /// Description of what was unexpected.
        message: String,
    },
}

impl GenerationError {
    /// Returns true if a later attempt could plausibly succeed.
    ///
    /// Only authentication failures and invalid requests are permanent;
    /// sending the same request again cannot fix them.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::ModelOverloaded { .. }
                | Self::Timeout { .. }
                | Self::Network { .. }
                | Self::EmptyResponse
                | Self::UnexpectedResponse { .. }
        )
    }
}

/// Session precondition errors.
///
/// Raised before any external call is issued.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The description was empty once sanitized.
    #[error("Input is empty after sanitization")]
    EmptyInput,

    /// A follow-up edit was requested before any component exists.
    #[error("No component exists yet: create one before editing")]
    NoComponent,

    /// A follow-up edit referenced an unknown artifact.
    #[error("Unknown artifact: {id}")]
    UnknownArtifact {
        /// The identifier that was not found.
        id: String,
    },
}

/// Configuration errors.
///
/// These represent failures in configuration loading and validation,
/// including the design-token source. They are fatal at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required configuration is missing.
    #[error("Missing required: {var}")]
    MissingRequired {
        /// The missing variable name.
        var: String,
    },

    /// Configuration value is invalid.
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue {
        /// The variable name.
        var: String,
        /// Why the value is invalid.
        reason: String,
    },

    /// The design-token document could not be read.
    #[error("Cannot read design system {path}: {message}")]
    TokenSourceUnreadable {
        /// Path of the token document.
        path: String,
        /// Underlying I/O message.
        message: String,
    },

    /// The design-token document is malformed.
    #[error("Malformed design system: {reason}")]
    MalformedTokens {
        /// What is wrong with the document.
        reason: String,
    },
}
