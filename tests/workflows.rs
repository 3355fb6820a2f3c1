//! Workflow integration tests entry point.
//!
//! This module includes all end-to-end workflows against a mock Messages API:
//! - Generation loop: generate → validate → correct → accept or exhaust
//! - Sessions: create → edit → use → save history
//! - Error recovery: transport failures, policies, cancellation

mod integration;
