//! Bracket and template-literal balance.

use super::{Check, Finding};
use crate::tokens::DesignSystem;

const RULE: &str = "syntax.brackets";

const PAIRS: &[(char, char, &str)] = &[
    ('{', '}', "braces"),
    ('(', ')', "parentheses"),
    ('[', ']', "square brackets"),
];

/// Counts opening and closing brackets of each kind and backticks.
///
/// Counting is naive: brackets inside strings and comments count too. A
/// component whose template contains a lone `{` in text is rejected, which the
/// generator can always avoid.
#[derive(Debug, Clone, Copy, Default)]
pub struct BracketBalanceCheck;

impl Check for BracketBalanceCheck {
    fn id(&self) -> &'static str {
        RULE
    }

    fn description(&self) -> &'static str {
        "Brackets are balanced and template literals are closed"
    }

    fn run(&self, code: &str, _tokens: &DesignSystem) -> Vec<Finding> {
        let mut findings: Vec<Finding> = PAIRS
            .iter()
            .filter_map(|&(open, close, name)| {
                let opened = code.chars().filter(|&c| c == open).count();
                let closed = code.chars().filter(|&c| c == close).count();
                (opened != closed).then(|| {
                    Finding::hard_fail(
                        RULE,
                        format!("Unbalanced {name}: {opened} '{open}' vs {closed} '{close}'"),
                    )
                })
            })
            .collect();

        let backticks = code.chars().filter(|&c| c == '`').count();
        if backticks % 2 != 0 {
            findings.push(Finding::hard_fail(
                RULE,
                format!("Odd number of backticks ({backticks}): unterminated template literal"),
            ));
        }

        findings
    }
}
