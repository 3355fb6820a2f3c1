//! Rule engine for generated component code.
//!
//! The [`Validator`] holds an ordered registry of independent [`Check`]s.
//! Each check looks at the candidate text and the design-token snapshot and
//! returns zero or more [`Finding`]s. Every check always runs, so one attempt
//! yields the complete defect list, and the result is a pure function of
//! `(code, tokens)`: findings come back in registration order, and each check
//! orders its own findings deterministically.
//!
//! The checks are literal and regex based. They do not parse TypeScript; a
//! parser-backed check can replace one of them behind the same trait.
//!
//! # Default registry
//!
//! | Order | Rule id | Check |
//! |---|---|---|
//! | 1 | `syntax.brackets` | [`BracketBalanceCheck`] |
//! | 2 | `format.leakage` | [`FormatLeakageCheck`] |
//! | 3 | `design.palette` | [`PaletteCheck`] |
//! | 4 | `structure.markers` | [`StructureCheck`] |
//! | opt-in | `security.unsafe_api` | [`UnsafeApiCheck`] |
//!
//! # Example
//!
//! ```
//! use component_architect::tokens::DesignSystem;
//! use component_architect::validator::Validator;
//!
//! let tokens = DesignSystem::default().with_token("colors", "primary", "#6366f1");
//! let findings = Validator::standard().validate("color: #ff0000;", &tokens);
//!
//! assert!(findings.iter().any(|f| f.message.contains("#ff0000")));
//! ```

mod brackets;
mod format;
mod palette;
mod security;
mod structure;

pub use brackets::BracketBalanceCheck;
pub use format::{FormatLeakageCheck, CONVERSATIONAL_PREFIXES};
pub use palette::{AllowedColors, PaletteCheck};
pub use security::UnsafeApiCheck;
pub use structure::{ComponentModel, StructureCheck};

use std::fmt;

use serde::Serialize;

use crate::config::Config;
use crate::tokens::DesignSystem;

/// How bad a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The candidate must not be accepted.
    HardFail,
}

/// One defect reported by a check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Finding {
    /// Identifier of the rule that produced the finding.
    pub rule: &'static str,
    /// Human-readable explanation, fed back to the generator verbatim.
    pub message: String,
    /// Severity of the defect.
    pub severity: Severity,
    /// The offending substring, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offending: Option<String>,
}

impl Finding {
    /// Create a hard-fail finding.
    #[must_use]
    pub fn hard_fail(rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
            severity: Severity::HardFail,
            offending: None,
        }
    }

    /// Attach the offending substring.
    #[must_use]
    pub fn with_offending(mut self, offending: impl Into<String>) -> Self {
        self.offending = Some(offending.into());
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule, self.message)
    }
}

/// A single, self-contained validation rule.
pub trait Check: Send + Sync {
    /// Rule identifier stamped on every finding of this check.
    fn id(&self) -> &'static str;

    /// One-line description of what the check enforces.
    fn description(&self) -> &'static str;

    /// Inspect `code` against `tokens`.
    fn run(&self, code: &str, tokens: &DesignSystem) -> Vec<Finding>;
}

/// Ordered registry of checks.
pub struct Validator {
    checks: Vec<Box<dyn Check>>,
}

impl Validator {
    /// A validator with no checks.
    #[must_use]
    pub fn empty() -> Self {
        Self { checks: Vec::new() }
    }

    /// The default registry for Angular components.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .with_check(BracketBalanceCheck)
            .with_check(FormatLeakageCheck)
            .with_check(PaletteCheck)
            .with_check(StructureCheck::new(ComponentModel::angular()))
    }

    /// The default registry plus whatever the configuration enables.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let validator = Self::standard();
        if config.security_rules {
            validator.with_check(UnsafeApiCheck::new(config.allowed_origins.clone()))
        } else {
            validator
        }
    }

    /// Append a check; it runs after every check already registered.
    pub fn register(&mut self, check: impl Check + 'static) {
        self.checks.push(Box::new(check));
    }

    /// Builder form of [`Validator::register`].
    #[must_use]
    pub fn with_check(mut self, check: impl Check + 'static) -> Self {
        self.register(check);
        self
    }

    /// Rule ids in execution order.
    #[must_use]
    pub fn check_ids(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.id()).collect()
    }

    /// Number of registered checks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// True when no check is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check and collect the findings. Empty means valid.
    #[must_use]
    pub fn validate(&self, code: &str, tokens: &DesignSystem) -> Vec<Finding> {
        let findings: Vec<Finding> = self
            .checks
            .iter()
            .flat_map(|check| check.run(code, tokens))
            .collect();

        tracing::debug!(
            checks = self.checks.len(),
            findings = findings.len(),
            "Validation complete"
        );

        findings
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("checks", &self.check_ids())
            .finish()
    }
}

/// Shorten `text` to `max` characters for messages.
pub(crate) fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
