//! Prompt composition.
//!
//! This module turns sanitized user text and the design-token snapshot into
//! a [`GenerationRequest`]: fixed system instructions plus a rendered user
//! prompt. Three shapes exist:
//!
//! - [`compose_initial`]: first attempt for a new component
//! - [`compose_edit`]: follow-up change to an existing component
//! - [`compose_correction`]: retry carrying the failed candidate and its
//!   findings
//!
//! Every rendered prompt lists the full token palette, fences the user text
//! as data, and states the raw-code output constraint before and after the
//! variable content.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use component_architect::prompts::{compose_initial, SYSTEM_PROMPT};
//! use component_architect::tokens::DesignSystem;
//!
//! let tokens = Arc::new(DesignSystem::default().with_token("colors", "primary", "#6366f1"));
//! let request = compose_initial("A login card", tokens);
//!
//! assert_eq!(request.system(), SYSTEM_PROMPT);
//! assert!(request.prompt().contains("#6366f1"));
//! ```

mod templates;

pub use templates::{EDIT_SESSION_ADDENDUM, OUTPUT_CONTRACT, SYSTEM_PROMPT};

use std::sync::Arc;

use serde::Serialize;

use crate::tokens::DesignSystem;
use crate::validator::Finding;
use templates::{
    CORRECTION_HEADING, CURRENT_CODE_HEADING, DESCRIPTION_HEADING, EDIT_HEADING, EDIT_TASK,
    GENERATE_TASK, PREVIOUS_CODE_HEADING, TAILWIND_HEADING, TOKENS_HEADING,
};

/// What a request asks the model to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestKind {
    /// Generate a new component from a description.
    Initial,
    /// Change an existing component.
    Edit {
        /// The component being edited.
        base_code: String,
    },
    /// Fix a candidate that failed validation.
    Correction {
        /// The rejected candidate, verbatim.
        prior_code: String,
        /// Everything the validator reported about it.
        findings: Vec<Finding>,
        /// The edit base when the failed request was an edit.
        #[serde(skip_serializing_if = "Option::is_none")]
        edit_base: Option<String>,
    },
}

/// One call's worth of input for the generation client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    #[serde(skip)]
    system: String,
    #[serde(skip)]
    tokens: Arc<DesignSystem>,
    user_text: String,
    #[serde(flatten)]
    kind: RequestKind,
}

impl GenerationRequest {
    /// The fixed system instructions.
    #[must_use]
    pub fn system(&self) -> &str {
        &self.system
    }

    /// The sanitized user description or edit instruction.
    #[must_use]
    pub fn user_text(&self) -> &str {
        &self.user_text
    }

    /// What the request asks for.
    #[must_use]
    pub const fn kind(&self) -> &RequestKind {
        &self.kind
    }

    /// The token snapshot the prompt was composed from.
    #[must_use]
    pub const fn tokens(&self) -> &Arc<DesignSystem> {
        &self.tokens
    }

    /// True for correction requests.
    #[must_use]
    pub const fn is_correction(&self) -> bool {
        matches!(self.kind, RequestKind::Correction { .. })
    }

    /// Render the user prompt.
    #[must_use]
    pub fn prompt(&self) -> String {
        let mut sections = vec![OUTPUT_CONTRACT.to_string(), self.palette_section()];

        match &self.kind {
            RequestKind::Initial => self.push_description(&mut sections),
            RequestKind::Edit { base_code } => self.push_edit(&mut sections, base_code),
            RequestKind::Correction {
                prior_code,
                findings,
                edit_base,
            } => {
                match edit_base {
                    Some(base_code) => self.push_edit(&mut sections, base_code),
                    None => self.push_description(&mut sections),
                }
                sections.push(correction_section(findings));
                sections.push(format!("{PREVIOUS_CODE_HEADING}\n{prior_code}"));
            }
        }

        sections.push(OUTPUT_CONTRACT.to_string());
        sections.join("\n\n")
    }

    fn palette_section(&self) -> String {
        let mut section = format!("{TOKENS_HEADING}\n{}", self.tokens.tokens_json());
        if let Some(tailwind) = self.tokens.tailwind_json() {
            section.push_str(&format!("\n\n{TAILWIND_HEADING}\n{tailwind}"));
        }
        section
    }

    fn push_description(&self, sections: &mut Vec<String>) {
        sections.push(format!(
            "{DESCRIPTION_HEADING}\n{}",
            fence(&self.user_text)
        ));
        sections.push(GENERATE_TASK.to_string());
    }

    fn push_edit(&self, sections: &mut Vec<String>, base_code: &str) {
        sections.push(format!("{CURRENT_CODE_HEADING}\n{base_code}"));
        sections.push(format!("{EDIT_HEADING}\n{}", fence(&self.user_text)));
        sections.push(EDIT_TASK.to_string());
    }
}

/// Wrap user text in triple quotes, neutralizing any triple quote inside it.
fn fence(text: &str) -> String {
    format!("\"\"\"{}\"\"\"", text.replace("\"\"\"", "'''"))
}

fn correction_section(findings: &[Finding]) -> String {
    let lines: Vec<String> = findings
        .iter()
        .map(|f| match f.offending.as_deref() {
            Some(offending) if !f.message.contains(offending) => {
                format!("  - {f}\n    offending: {offending}")
            }
            _ => format!("  - {f}"),
        })
        .collect();
    format!("{CORRECTION_HEADING}\n{}", lines.join("\n"))
}

/// Request for the first attempt at a new component.
#[must_use]
pub fn compose_initial(sanitized_text: &str, tokens: Arc<DesignSystem>) -> GenerationRequest {
    GenerationRequest {
        system: SYSTEM_PROMPT.to_string(),
        tokens,
        user_text: sanitized_text.to_string(),
        kind: RequestKind::Initial,
    }
}

/// Request for a follow-up change to `base_code`.
#[must_use]
pub fn compose_edit(
    base_code: &str,
    sanitized_instruction: &str,
    tokens: Arc<DesignSystem>,
) -> GenerationRequest {
    GenerationRequest {
        system: format!("{SYSTEM_PROMPT}\n\n{EDIT_SESSION_ADDENDUM}"),
        tokens,
        user_text: sanitized_instruction.to_string(),
        kind: RequestKind::Edit {
            base_code: base_code.to_string(),
        },
    }
}

/// Request asking the model to fix `prior_code`.
///
/// Keeps the original description (or edit base and instruction) of
/// `original`, and replaces any earlier correction context with this one.
#[must_use]
pub fn compose_correction(
    prior_code: &str,
    findings: &[Finding],
    original: &GenerationRequest,
) -> GenerationRequest {
    let edit_base = match &original.kind {
        RequestKind::Initial => None,
        RequestKind::Edit { base_code } => Some(base_code.clone()),
        RequestKind::Correction { edit_base, .. } => edit_base.clone(),
    };

    GenerationRequest {
        system: original.system.clone(),
        tokens: Arc::clone(&original.tokens),
        user_text: original.user_text.clone(),
        kind: RequestKind::Correction {
            prior_code: prior_code.to_string(),
            findings: findings.to_vec(),
            edit_base,
        },
    }
}
