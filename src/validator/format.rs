//! Detects chat formatting leaking into what should be raw code.

use super::{preview, Check, Finding};
use crate::tokens::DesignSystem;

const RULE: &str = "format.leakage";

const FENCE: &str = "```";

/// Lowercase prefixes that mark a first line as conversational prose.
pub const CONVERSATIONAL_PREFIXES: &[&str] = &[
    "here is",
    "here's",
    "sure",
    "of course",
    "certainly",
    "i'll",
    "i will",
    "this is",
    "below is",
];

/// Rejects markdown fences and a leading conversational line.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatLeakageCheck;

impl Check for FormatLeakageCheck {
    fn id(&self) -> &'static str {
        RULE
    }

    fn description(&self) -> &'static str {
        "Output is raw code with no markdown fences or chat preamble"
    }

    fn run(&self, code: &str, _tokens: &DesignSystem) -> Vec<Finding> {
        let mut findings = Vec::new();

        if code.contains(FENCE) {
            findings.push(
                Finding::hard_fail(
                    RULE,
                    "Code contains markdown fences (```); output must be raw code only",
                )
                .with_offending(FENCE),
            );
        }

        if let Some(first) = code.lines().map(str::trim).find(|l| !l.is_empty()) {
            let lower = first.to_lowercase();
            if CONVERSATIONAL_PREFIXES.iter().any(|p| lower.starts_with(p)) {
                findings.push(
                    Finding::hard_fail(
                        RULE,
                        format!(
                            "Response starts with conversational text: \"{}\"",
                            preview(first, 60)
                        ),
                    )
                    .with_offending(first),
                );
            }
        }

        findings
    }
}
