//! Design-token snapshot.
//!
//! The design system is a JSON document of token groups:
//!
//! ```json
//! {
//!   "tokens": {
//!     "colors": { "primary": "#6366f1" },
//!     "effects": { "glass-bg": "rgba(255, 255, 255, 0.08)" }
//!   },
//!   "tailwind_classes": { "primary-button": "bg-[#6366f1] text-white" },
//!   "allowed_raw_colors": ["#ffffff"]
//! }
//! ```
//!
//! It is loaded once before any session starts and shared read-only behind an
//! `Arc`; the prompt composer and the validator always see the same snapshot.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Group that must be present in every design system.
pub const REQUIRED_GROUP: &str = "colors";

/// Immutable set of named design tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignSystem {
    tokens: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    tailwind_classes: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    allowed_raw_colors: Vec<String>,
}

impl DesignSystem {
    /// Parse a design system from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedTokens`] when the JSON does not parse,
    /// a token value is not a string, or the `colors` group is missing.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let system: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::MalformedTokens {
                reason: e.to_string(),
            })?;

        if !system.tokens.contains_key(REQUIRED_GROUP) {
            return Err(ConfigError::MalformedTokens {
                reason: format!("missing `tokens.{REQUIRED_GROUP}` group"),
            });
        }

        if let Some((group, name)) = system
            .tokens
            .iter()
            .flat_map(|(g, entries)| entries.iter().map(move |(n, v)| (g, n, v)))
            .find(|(_, _, value)| value.trim().is_empty())
            .map(|(g, n, _)| (g, n))
        {
            return Err(ConfigError::MalformedTokens {
                reason: format!("token `{group}.{name}` has an empty value"),
            });
        }

        Ok(system)
    }

    /// Load a design system from a file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TokenSourceUnreadable`] if the file cannot be
    /// read, or the errors of [`DesignSystem::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::TokenSourceUnreadable {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        let system = Self::from_json_str(&text)?;
        tracing::info!(
            path = %path.display(),
            tokens = system.len(),
            "Design system loaded"
        );
        Ok(system)
    }

    /// Add a token, creating its group if needed.
    #[must_use]
    pub fn with_token(
        mut self,
        group: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.tokens
            .entry(group.into())
            .or_default()
            .insert(name.into(), value.into());
        self
    }

    /// Add a utility-class hint shown to the model.
    #[must_use]
    pub fn with_tailwind_class(mut self, name: impl Into<String>, classes: impl Into<String>) -> Self {
        self.tailwind_classes
            .insert(name.into(), serde_json::Value::String(classes.into()));
        self
    }

    /// Accept a literal color that is not itself a token value.
    #[must_use]
    pub fn with_allowed_raw_color(mut self, color: impl Into<String>) -> Self {
        self.allowed_raw_colors.push(color.into());
        self
    }

    /// Look up a token by `group.name`.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&str> {
        let (group, name) = key.split_once('.')?;
        self.tokens.get(group)?.get(name).map(String::as_str)
    }

    /// Every token value, in `group.name` order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.tokens
            .values()
            .flat_map(|entries| entries.values().map(String::as_str))
    }

    /// Literal colors accepted in addition to token values.
    #[must_use]
    pub fn allowed_raw_colors(&self) -> &[String] {
        &self.allowed_raw_colors
    }

    /// Number of tokens across all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.values().map(BTreeMap::len).sum()
    }

    /// True when no token is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Token groups as pretty JSON, for prompts.
    #[must_use]
    pub fn tokens_json(&self) -> String {
        serde_json::to_string_pretty(&self.tokens).unwrap_or_default()
    }

    /// Utility-class hints as pretty JSON, `None` when there are none.
    #[must_use]
    pub fn tailwind_json(&self) -> Option<String> {
        if self.tailwind_classes.is_empty() {
            return None;
        }
        serde_json::to_string_pretty(&self.tailwind_classes).ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const SAMPLE: &str = r##"{
        "tokens": {
            "colors": { "primary": "#6366f1", "surface": "#1e293b" },
            "effects": { "glass-bg": "rgba(255, 255, 255, 0.08)" },
            "spacing": {}
        },
        "tailwind_classes": { "card": "bg-[#1e293b] rounded-[8px]" }
    }"##;

    #[test]
    fn test_parse_sample() {
        let system = DesignSystem::from_json_str(SAMPLE).unwrap();
        assert_eq!(system.len(), 3);
        assert_eq!(system.lookup("colors.primary"), Some("#6366f1"));
        assert_eq!(
            system.lookup("effects.glass-bg"),
            Some("rgba(255, 255, 255, 0.08)")
        );
        assert!(system.tailwind_json().unwrap().contains("rounded-[8px]"));
    }

    #[test]
    fn test_lookup_unknown_key() {
        let system = DesignSystem::from_json_str(SAMPLE).unwrap();
        assert_eq!(system.lookup("colors.missing"), None);
        assert_eq!(system.lookup("nodot"), None);
    }

    #[test]
    fn test_missing_colors_group() {
        let err = DesignSystem::from_json_str(r#"{"tokens": {"spacing": {}}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedTokens { reason } if reason.contains("colors")));
    }

    #[test]
    fn test_missing_tokens_key() {
        let err = DesignSystem::from_json_str(r#"{"palette": {}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedTokens { .. }));
    }

    #[test]
    fn test_non_string_token_value() {
        let err =
            DesignSystem::from_json_str(r#"{"tokens": {"colors": {"primary": 42}}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedTokens { .. }));
    }

    #[test]
    fn test_empty_token_value() {
        let err =
            DesignSystem::from_json_str(r#"{"tokens": {"colors": {"primary": " "}}}"#).unwrap_err();
        assert!(
            matches!(err, ConfigError::MalformedTokens { reason } if reason.contains("colors.primary"))
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let system = DesignSystem::load(file.path()).unwrap();
        assert_eq!(system.lookup("colors.surface"), Some("#1e293b"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = DesignSystem::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::TokenSourceUnreadable { .. }));
    }

    #[test]
    fn test_builder_and_values_order() {
        let system = DesignSystem::default()
            .with_token("colors", "b", "#222222")
            .with_token("colors", "a", "#111111")
            .with_allowed_raw_color("#ffffff");
        let values: Vec<&str> = system.values().collect();
        assert_eq!(values, vec!["#111111", "#222222"]);
        assert_eq!(system.allowed_raw_colors(), ["#ffffff".to_string()]);
        assert!(system.tailwind_json().is_none());
    }

    #[test]
    fn test_tokens_json_lists_every_group() {
        let system = DesignSystem::from_json_str(SAMPLE).unwrap();
        let json = system.tokens_json();
        assert!(json.contains("\"colors\""));
        assert!(json.contains("\"effects\""));
        assert!(json.contains("#6366f1"));
    }
}
