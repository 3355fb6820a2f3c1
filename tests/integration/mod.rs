//! Integration tests for Component Architect.
//!
//! These tests drive the real HTTP client against a `wiremock` server:
//! - Full generate-validate-correct sessions
//! - Multi-turn edit sessions
//! - Error recovery paths

mod common;
mod error_recovery;
mod generation_loop;
mod session_workflow;
