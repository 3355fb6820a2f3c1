//! Multi-turn component sessions.
//!
//! A [`ComponentSession`] runs a create turn followed by any number of edit
//! turns. Every turn goes through the [`RetryController`]; the code it
//! produces (accepted, or the best-effort last candidate) is kept in an
//! [`ArtifactStore`] under a short identifier so later edits can target it.
//!
//! # Example
//!
//! ```
//! use component_architect::session::{ArtifactOrigin, ArtifactStore};
//!
//! let mut store = ArtifactStore::new();
//! let id = store.insert("export class A {}", true, ArtifactOrigin::Create, None).id.clone();
//! assert_eq!(id, "v1");
//! assert_eq!(store.get("v1").map(|a| a.code.as_str()), Some("export class A {}"));
//! ```

mod store;

pub use store::{Artifact, ArtifactOrigin, ArtifactStore};

use std::path::Path;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::controller::{OutcomeStatus, RetryController, SessionOutcome};
use crate::error::{AppError, SessionError};
use crate::traits::GenerationClient;

/// Kind of session turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    /// New component from a description.
    Create,
    /// Change to an existing component.
    Edit,
}

/// Summary of one turn, as saved to the history file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// Create or edit.
    #[serde(rename = "type")]
    pub kind: TurnKind,
    /// The description or edit instruction as typed.
    pub prompt: String,
    /// Artifact produced by the turn, if any code came back.
    pub artifact: Option<String>,
    /// How the turn's session ended.
    pub status: OutcomeStatus,
    /// Generation calls used.
    pub attempts: usize,
    /// Whether the produced code passed validation.
    pub valid: bool,
    /// Findings left on the last attempt.
    pub errors: Vec<String>,
}

impl HistoryEntry {
    fn from_outcome(
        kind: TurnKind,
        prompt: &str,
        artifact: Option<String>,
        outcome: &SessionOutcome,
    ) -> Self {
        let errors = if outcome.success {
            Vec::new()
        } else {
            outcome
                .last_findings()
                .iter()
                .map(ToString::to_string)
                .collect()
        };
        Self {
            kind,
            prompt: prompt.to_string(),
            artifact,
            status: outcome.status,
            attempts: outcome.attempts_used(),
            valid: outcome.success,
            errors,
        }
    }
}

/// A create-then-edit conversation about one component.
pub struct ComponentSession<C> {
    controller: RetryController<C>,
    store: ArtifactStore,
    current: Option<String>,
    history: Vec<HistoryEntry>,
}

impl<C: GenerationClient> ComponentSession<C> {
    /// Start a session backed by `controller`.
    #[must_use]
    pub fn new(controller: RetryController<C>) -> Self {
        Self::with_store(controller, ArtifactStore::new())
    }

    /// Start a session with a preconfigured store.
    #[must_use]
    pub fn with_store(controller: RetryController<C>, store: ArtifactStore) -> Self {
        Self {
            controller,
            store,
            current: None,
            history: Vec::new(),
        }
    }

    /// Generate a new component and make it current.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyInput`] if the description sanitizes to
    /// nothing.
    pub async fn create(
        &mut self,
        description: &str,
        cancel: &CancellationToken,
    ) -> Result<SessionOutcome, SessionError> {
        let outcome = self.controller.run(description, cancel).await?;
        self.record(TurnKind::Create, description, None, &outcome);
        Ok(outcome)
    }

    /// Apply `instruction` to the current artifact, or to `target` if given.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoComponent`] when nothing has been created
    /// yet, [`SessionError::UnknownArtifact`] when `target` does not exist,
    /// and [`SessionError::EmptyInput`] if the instruction sanitizes to
    /// nothing.
    pub async fn edit(
        &mut self,
        instruction: &str,
        target: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<SessionOutcome, SessionError> {
        let base = self.resolve(target)?;
        let (base_id, base_code) = (base.id.clone(), base.code.clone());

        let outcome = self
            .controller
            .edit(&base_code, instruction, cancel)
            .await?;
        self.record(TurnKind::Edit, instruction, Some(base_id), &outcome);
        Ok(outcome)
    }

    /// Make `id` the artifact later edits apply to.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownArtifact`] if `id` is not stored.
    pub fn use_artifact(&mut self, id: &str) -> Result<&Artifact, SessionError> {
        let artifact = self
            .store
            .get(id)
            .ok_or_else(|| SessionError::UnknownArtifact { id: id.to_string() })?;
        self.current = Some(artifact.id.clone());
        Ok(artifact)
    }

    /// The artifact edits currently apply to.
    #[must_use]
    pub fn current(&self) -> Option<&Artifact> {
        self.current.as_deref().and_then(|id| self.store.get(id))
    }

    /// Code of the current artifact.
    #[must_use]
    pub fn current_code(&self) -> Option<&str> {
        self.current().map(|a| a.code.as_str())
    }

    /// Every stored artifact.
    #[must_use]
    pub const fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Turn summaries, oldest first.
    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// The controller driving each turn.
    #[must_use]
    pub const fn controller(&self) -> &RetryController<C> {
        &self.controller
    }

    /// Write the turn history to `path` as pretty-printed JSON, creating
    /// parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] if the file cannot be written.
    pub async fn save_history(&self, path: impl AsRef<Path>) -> Result<(), AppError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&self.history)?;
        tokio::fs::write(path, json).await?;
        tracing::info!(path = %path.display(), turns = self.history.len(), "History saved");
        Ok(())
    }

    fn resolve(&self, target: Option<&str>) -> Result<&Artifact, SessionError> {
        match target {
            Some(id) => self
                .store
                .get(id)
                .ok_or_else(|| SessionError::UnknownArtifact { id: id.to_string() }),
            None => self.current().ok_or(SessionError::NoComponent),
        }
    }

    fn record(
        &mut self,
        kind: TurnKind,
        prompt: &str,
        parent: Option<String>,
        outcome: &SessionOutcome,
    ) {
        let origin = match kind {
            TurnKind::Create => ArtifactOrigin::Create,
            TurnKind::Edit => ArtifactOrigin::Edit,
        };
        let artifact = outcome.best_effort_code().map(|code| {
            let id = self
                .store
                .insert(code, outcome.success, origin, parent)
                .id
                .clone();
            self.current = Some(id.clone());
            id
        });
        self.history
            .push(HistoryEntry::from_outcome(kind, prompt, artifact, outcome));
    }
}

impl<C> std::fmt::Debug for ComponentSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentSession")
            .field("current", &self.current)
            .field("artifacts", &self.store.len())
            .field("turns", &self.history.len())
            .finish_non_exhaustive()
    }
}
