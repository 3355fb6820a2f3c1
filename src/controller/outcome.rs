//! Session audit trail.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::GenerationError;
use crate::prompts::GenerationRequest;
use crate::validator::Finding;

/// What one generation call produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttemptResult {
    /// Raw text returned by the model.
    Candidate {
        /// The candidate component code.
        code: String,
    },
    /// The call failed before any text came back.
    TransportFailure {
        /// The classified failure.
        error: GenerationError,
    },
    /// The call was sent, then abandoned when the session was cancelled.
    Cancelled,
}

impl AttemptResult {
    /// The candidate code, if the call produced one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Candidate { code } => Some(code),
            Self::TransportFailure { .. } | Self::Cancelled => None,
        }
    }
}

/// One generate-and-validate cycle.
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    /// Position in the session, starting at 1.
    pub index: u32,
    /// The request that was sent.
    pub request: GenerationRequest,
    /// What came back.
    pub result: AttemptResult,
    /// Validation findings; empty means the candidate was accepted.
    pub findings: Vec<Finding>,
    /// When the call was issued.
    pub started_at: DateTime<Utc>,
    /// Wall time of the call.
    pub elapsed_ms: u64,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// A candidate passed every check.
    Accepted,
    /// Every attempt was used without a valid candidate.
    Exhausted,
    /// The caller cancelled the session.
    Cancelled,
    /// A transport failure ended the session early.
    Aborted,
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Accepted => "accepted",
            Self::Exhausted => "exhausted",
            Self::Cancelled => "cancelled",
            Self::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// Result of a session, returned for every terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    /// Correlates log lines with this outcome.
    pub session_id: String,
    /// How the session ended.
    pub status: OutcomeStatus,
    /// True exactly when the last attempt's candidate had no findings.
    pub success: bool,
    /// The accepted code. `None` unless `status` is `Accepted`.
    pub final_code: Option<String>,
    /// Every attempt, in order.
    pub attempts: Vec<Attempt>,
}

impl SessionOutcome {
    /// Build an outcome, deriving `success` and `final_code` from `status`
    /// and the history.
    #[must_use]
    pub fn new(session_id: String, status: OutcomeStatus, attempts: Vec<Attempt>) -> Self {
        let final_code = if status == OutcomeStatus::Accepted {
            attempts
                .last()
                .and_then(|a| a.result.code())
                .map(ToString::to_string)
        } else {
            None
        };
        let success = final_code.is_some();
        Self {
            session_id,
            status,
            success,
            final_code,
            attempts,
        }
    }

    /// Generation calls issued.
    #[must_use]
    pub fn attempts_used(&self) -> usize {
        self.attempts.len()
    }

    /// Code from the most recent attempt that produced any.
    #[must_use]
    pub fn last_candidate(&self) -> Option<&str> {
        self.attempts.iter().rev().find_map(|a| a.result.code())
    }

    /// Findings of the last attempt. Empty when no attempt was made.
    #[must_use]
    pub fn last_findings(&self) -> &[Finding] {
        self.attempts.last().map_or(&[], |a| a.findings.as_slice())
    }

    /// The accepted code, or the last candidate for diagnosis.
    #[must_use]
    pub fn best_effort_code(&self) -> Option<&str> {
        self.final_code.as_deref().or_else(|| self.last_candidate())
    }
}
