//! Trait definitions for mockable dependencies.
//!
//! This module defines traits for:
//! - [`GenerationClient`]: the model backend that turns a prompt into code
//! - [`TimeProvider`]: Time abstraction for testing
//!
//! # Mocking
//!
//! All traits are annotated with `#[cfg_attr(test, mockall::automock)]`
//! which generates mock implementations automatically for testing.
//!
//! # Example
//!
//! ```
//! use component_architect::traits::{TimeProvider, RealTimeProvider};
//!
//! let time_provider = RealTimeProvider;
//! let now = time_provider.now();
//! println!("Current time: {now}");
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::GenerationError;

/// Generation backend trait for mocking.
///
/// One call is one attempt: implementations must not retry internally, since
/// the retry controller owns the attempt budget.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Send a prompt and return the model's text.
    ///
    /// # Arguments
    ///
    /// * `system` - Fixed system instructions
    /// * `prompt` - The composed user prompt
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] if the backend fails or returns nothing.
    async fn generate(&self, system: String, prompt: String) -> Result<String, GenerationError>;
}

/// Time provider trait for deterministic testing.
///
/// This trait abstracts time operations to allow for
/// deterministic testing by providing fixed timestamps.
#[cfg_attr(test, mockall::automock)]
pub trait TimeProvider: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Real time provider using system clock.
///
/// This is the production implementation that returns the actual current time.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
