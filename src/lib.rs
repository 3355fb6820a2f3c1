//! Component Architect
//!
//! Guided generation of UI component source code from natural-language
//! descriptions, checked against a design-token system and corrected in a
//! bounded loop.
//!
//! # Features
//!
//! - Prompt-injection scrubbing of user text before it reaches the model
//! - Prompts that pin the model to the design-token palette
//! - A rule-based validator (syntax balance, format leakage, palette
//!   compliance, structural markers, optional unsafe-API rule)
//! - A bounded generate-validate-correct loop with a full audit trail
//! - Multi-turn edit sessions over stored artifacts
//!
//! # Quick Start
//!
//! ```bash
//! ANTHROPIC_API_KEY=sk-ant-xxx ./component-architect generate "A login card"
//! ```
//!
//! # Architecture
//!
//! ```text
//! user text ─▶ Sanitizer ─▶ Prompt Composer ─▶ GenerationClient ─▶ Validator
//!                                 ▲                                   │
//!                                 └──────── correction (findings) ◀───┘
//!                                           until accepted, cancelled
//!                                           or the budget runs out
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod anthropic;
pub mod config;
pub mod controller;
pub mod error;
pub mod prompts;
pub mod sanitizer;
pub mod session;
pub mod tokens;
pub mod traits;
pub mod validator;

#[cfg(test)]
mod test_utils;
