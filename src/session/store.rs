//! In-memory artifact store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::traits::{RealTimeProvider, TimeProvider};

/// How an artifact came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactOrigin {
    /// First component of a session.
    Create,
    /// Result of a follow-up edit.
    Edit,
}

/// A piece of generated code kept for later edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Short identifier (`v1`, `v2`, ...).
    pub id: String,
    /// The component code.
    pub code: String,
    /// Whether the code passed validation.
    pub valid: bool,
    /// How it was produced.
    pub origin: ArtifactOrigin,
    /// The artifact this one was edited from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Storage timestamp.
    pub created_at: DateTime<Utc>,
}

/// Maps short identifiers to previously produced code.
///
/// Identifiers are assigned sequentially and never reused.
pub struct ArtifactStore {
    artifacts: Vec<Artifact>,
    clock: Arc<dyn TimeProvider>,
}

impl ArtifactStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(RealTimeProvider))
    }

    /// Create an empty store stamping artifacts with `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            artifacts: Vec::new(),
            clock,
        }
    }

    /// Store `code` and return the new artifact.
    pub fn insert(
        &mut self,
        code: impl Into<String>,
        valid: bool,
        origin: ArtifactOrigin,
        parent: Option<String>,
    ) -> &Artifact {
        let id = format!("v{}", self.artifacts.len() + 1);
        tracing::debug!(artifact = %id, valid, "Artifact stored");
        self.artifacts.push(Artifact {
            id,
            code: code.into(),
            valid,
            origin,
            parent,
            created_at: self.clock.now(),
        });
        &self.artifacts[self.artifacts.len() - 1]
    }

    /// Look up an artifact. Identifiers are matched case-insensitively.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Artifact> {
        let id = id.trim();
        self.artifacts.iter().find(|a| a.id.eq_ignore_ascii_case(id))
    }

    /// The most recently stored artifact.
    #[must_use]
    pub fn latest(&self) -> Option<&Artifact> {
        self.artifacts.last()
    }

    /// All artifacts, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter()
    }

    /// Number of stored artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// True if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl Default for ArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("artifacts", &self.artifacts)
            .finish_non_exhaustive()
    }
}
