//! Redacting wrapper for the generation API key.

use std::fmt;

/// A string that never prints its value through `Debug` or `Display`.
///
/// The API key travels inside [`Config`](super::Config), which is logged at
/// startup; wrapping it keeps the key out of those logs.
///
/// # Example
///
/// ```
/// use component_architect::config::SecretString;
///
/// let secret = SecretString::new("sk-ant-api-key-123");
/// assert_eq!(format!("{:?}", secret), "<REDACTED>");
/// assert_eq!(secret.expose(), "sk-ant-api-key-123");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw value, for building the request header only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// True when the wrapped value is empty or whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
