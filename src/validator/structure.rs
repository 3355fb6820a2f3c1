//! Required markers of the target component model.

use super::{Check, Finding};
use crate::tokens::DesignSystem;

const RULE: &str = "structure.markers";

/// Literal markers every component of a framework must contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentModel {
    /// Framework name, used in messages.
    pub name: &'static str,
    /// `(marker, message when missing)` pairs, checked in order.
    pub markers: Vec<(&'static str, &'static str)>,
}

impl ComponentModel {
    /// Angular standalone components.
    #[must_use]
    pub fn angular() -> Self {
        Self {
            name: "Angular",
            markers: vec![
                ("@Component", "Missing @Component decorator"),
                (
                    "export class",
                    "Missing exported component class (`export class`)",
                ),
            ],
        }
    }
}

impl Default for ComponentModel {
    fn default() -> Self {
        Self::angular()
    }
}

/// Reports each required marker that does not appear in the code.
#[derive(Debug, Clone, Default)]
pub struct StructureCheck {
    model: ComponentModel,
}

impl StructureCheck {
    /// Check against `model`.
    #[must_use]
    pub const fn new(model: ComponentModel) -> Self {
        Self { model }
    }

    /// The component model checked against.
    #[must_use]
    pub const fn model(&self) -> &ComponentModel {
        &self.model
    }
}

impl Check for StructureCheck {
    fn id(&self) -> &'static str {
        RULE
    }

    fn description(&self) -> &'static str {
        "Component declares the framework's required markers"
    }

    fn run(&self, code: &str, _tokens: &DesignSystem) -> Vec<Finding> {
        self.model
            .markers
            .iter()
            .filter(|(marker, _)| !code.contains(marker))
            .map(|(marker, message)| Finding::hard_fail(RULE, *message).with_offending(*marker))
            .collect()
    }
}
