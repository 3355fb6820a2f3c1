//! Design-token palette enforcement.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{preview, Check, Finding};
use crate::tokens::DesignSystem;

const RULE: &str = "design.palette";

static HEX_COLOR: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"#[0-9a-fA-F]{3,8}\b").ok());

static RGB_COLOR: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)rgba?\([^)]*\)").ok());

/// Color literals in `text` as `(byte offset, literal)`, in text order.
fn color_literals(text: &str) -> Vec<(usize, &str)> {
    let mut found: Vec<(usize, &str)> = [&*HEX_COLOR, &*RGB_COLOR]
        .into_iter()
        .flatten()
        .flat_map(|re| re.find_iter(text).map(|m| (m.start(), m.as_str())))
        .collect();
    found.sort_by_key(|(start, _)| *start);
    found
}

/// Lowercase with all whitespace removed, so `RGBA(1, 2, 3, 0.5)` and
/// `rgba(1,2,3,0.5)` compare equal.
fn normalize(literal: &str) -> String {
    literal
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalized color literals a design system permits.
///
/// Built from every color literal that appears inside a token value, plus the
/// document's `allowed_raw_colors`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedColors(HashSet<String>);

impl AllowedColors {
    /// Collect the permitted literals of `tokens`.
    #[must_use]
    pub fn from_tokens(tokens: &DesignSystem) -> Self {
        let set = tokens
            .values()
            .chain(tokens.allowed_raw_colors().iter().map(String::as_str))
            .flat_map(color_literals)
            .map(|(_, literal)| normalize(literal))
            .collect();
        Self(set)
    }

    /// Whether `literal` is permitted.
    #[must_use]
    pub fn contains(&self, literal: &str) -> bool {
        self.0.contains(&normalize(literal))
    }

    /// Number of distinct permitted literals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing is permitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Flags hex and `rgb()`/`rgba()` color literals that are not token values.
///
/// Each distinct literal is reported once, at its first occurrence.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaletteCheck;

impl Check for PaletteCheck {
    fn id(&self) -> &'static str {
        RULE
    }

    fn description(&self) -> &'static str {
        "Every color literal is a design-token value"
    }

    fn run(&self, code: &str, tokens: &DesignSystem) -> Vec<Finding> {
        let allowed = AllowedColors::from_tokens(tokens);
        let mut seen = HashSet::new();

        color_literals(code)
            .into_iter()
            .filter(|(_, literal)| !allowed.contains(literal))
            .filter(|(_, literal)| seen.insert(normalize(literal)))
            .map(|(_, literal)| {
                Finding::hard_fail(
                    RULE,
                    format!(
                        "Hard-coded color '{}' is not in the design system; use a design token value",
                        preview(literal, 60)
                    ),
                )
                .with_offending(literal)
            })
            .collect()
    }
}
