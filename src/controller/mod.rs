//! Bounded generate-validate-correct loop.
//!
//! A [`RetryController`] drives one session through these states:
//!
//! ```text
//! Start -> Generating -> Validating -> Accepted
//!              ^             |
//!              |             +-> Correcting --+
//!              |                              |
//!              +------------------------------+
//!                            |
//!                            +-> Exhausted
//! ```
//!
//! plus the terminal `Cancelled` (cancellation token fired) and `Aborted`
//! (a transport failure that retrying cannot fix, or any transport failure
//! under [`TransportFailurePolicy::Fatal`]).
//!
//! The controller never issues more than `max_attempts` generation calls,
//! and a session succeeds exactly when its last attempt produced a candidate
//! with no findings.

mod outcome;

pub use outcome::{Attempt, AttemptResult, OutcomeStatus, SessionOutcome};

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{GenerationError, SessionError};
use crate::prompts::{compose_correction, compose_edit, compose_initial, GenerationRequest};
use crate::sanitizer::{Sanitizer, DEFAULT_MAX_CHARS};
use crate::tokens::DesignSystem;
use crate::traits::{GenerationClient, RealTimeProvider, TimeProvider};
use crate::validator::{Finding, Validator};

/// Rule id of the finding recorded when a call produced no candidate.
pub const EMPTY_OUTPUT_RULE: &str = "generation.empty_output";

/// Default generation calls per session (one initial attempt, three retries).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Default bound on a single generation call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// What a failed generation call does to the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportFailurePolicy {
    /// Record the attempt and keep going while the budget lasts.
    #[default]
    ConsumeAttempt,
    /// Record the attempt and abort the session.
    Fatal,
}

impl FromStr for TransportFailurePolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "consume" | "consume_attempt" => Ok(Self::ConsumeAttempt),
            "fatal" => Ok(Self::Fatal),
            _ => Err(()),
        }
    }
}

/// Retry controller settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Generation calls per session, including the first.
    pub max_attempts: u32,
    /// Upper bound on one generation call.
    pub request_timeout: Duration,
    /// Sanitizer character limit.
    pub max_input_chars: usize,
    /// What a failed generation call does.
    pub transport_failure_policy: TransportFailurePolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_input_chars: DEFAULT_MAX_CHARS,
            transport_failure_policy: TransportFailurePolicy::ConsumeAttempt,
        }
    }
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Input received, nothing sent yet.
    Start,
    /// A generation call is in flight.
    Generating,
    /// A candidate is being checked.
    Validating,
    /// A candidate passed every check.
    Accepted,
    /// A correction request is being prepared.
    Correcting,
    /// The attempt budget ran out.
    Exhausted,
    /// The caller cancelled the session.
    Cancelled,
    /// A transport failure ended the session.
    Aborted,
}

impl SessionState {
    /// True for states a session never leaves.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Accepted | Self::Exhausted | Self::Cancelled | Self::Aborted
        )
    }
}

/// Runs sessions against one client, validator and token snapshot.
///
/// Holds no per-session state, so one controller can run any number of
/// sessions, concurrently if the client allows it.
pub struct RetryController<C> {
    client: C,
    validator: Arc<Validator>,
    tokens: Arc<DesignSystem>,
    sanitizer: Sanitizer,
    config: ControllerConfig,
    clock: Arc<dyn TimeProvider>,
}

impl<C: GenerationClient> RetryController<C> {
    /// Create a controller.
    #[must_use]
    pub fn new(
        client: C,
        validator: Arc<Validator>,
        tokens: Arc<DesignSystem>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            client,
            validator,
            tokens,
            sanitizer: Sanitizer::new(config.max_input_chars),
            config,
            clock: Arc::new(RealTimeProvider),
        }
    }

    /// Use `clock` for attempt timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn TimeProvider>) -> Self {
        self.clock = clock;
        self
    }

    /// The controller settings.
    #[must_use]
    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// The token snapshot every session validates against.
    #[must_use]
    pub const fn tokens(&self) -> &Arc<DesignSystem> {
        &self.tokens
    }

    /// Generate a new component from a user description.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyInput`] when nothing is left of the
    /// description after sanitization. No generation call is made then.
    pub async fn run(
        &self,
        description: &str,
        cancel: &CancellationToken,
    ) -> Result<SessionOutcome, SessionError> {
        let text = self.sanitize(description)?;
        let request = compose_initial(&text, Arc::clone(&self.tokens));
        Ok(self.run_request(request, cancel).await)
    }

    /// Apply a follow-up edit instruction to `base_code`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyInput`] when nothing is left of the
    /// instruction after sanitization.
    pub async fn edit(
        &self,
        base_code: &str,
        instruction: &str,
        cancel: &CancellationToken,
    ) -> Result<SessionOutcome, SessionError> {
        let text = self.sanitize(instruction)?;
        let request = compose_edit(base_code, &text, Arc::clone(&self.tokens));
        Ok(self.run_request(request, cancel).await)
    }

    fn sanitize(&self, input: &str) -> Result<String, SessionError> {
        let report = self.sanitizer.sanitize_with_report(input);
        if !report.removed.is_empty() {
            tracing::warn!(
                patterns = ?report.removed,
                "Removed control markers from user input"
            );
        }
        if report.truncated {
            tracing::info!(
                max_chars = self.sanitizer.max_chars(),
                "User input truncated"
            );
        }
        if report.text.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        Ok(report.text)
    }

    async fn run_request(
        &self,
        request: GenerationRequest,
        cancel: &CancellationToken,
    ) -> SessionOutcome {
        let session_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("session", session_id = %session_id);
        self.drive(session_id, request, cancel).instrument(span).await
    }

    async fn drive(
        &self,
        session_id: String,
        mut request: GenerationRequest,
        cancel: &CancellationToken,
    ) -> SessionOutcome {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempts: Vec<Attempt> = Vec::new();

        tracing::info!(
            max_attempts,
            input_chars = request.user_text().chars().count(),
            "Session started"
        );

        loop {
            if cancel.is_cancelled() {
                return finish(session_id, OutcomeStatus::Cancelled, attempts);
            }

            let index = u32::try_from(attempts.len()).unwrap_or(u32::MAX) + 1;
            transition(SessionState::Generating, index);

            let started_at = self.clock.now();
            let start = Instant::now();
            let call = tokio::time::timeout(
                self.config.request_timeout,
                self.client
                    .generate(request.system().to_string(), request.prompt()),
            );

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    tracing::info!(attempt = index, elapsed_ms, "Cancelled during generation");
                    attempts.push(Attempt {
                        index,
                        request,
                        result: AttemptResult::Cancelled,
                        findings: Vec::new(),
                        started_at,
                        elapsed_ms,
                    });
                    return finish(session_id, OutcomeStatus::Cancelled, attempts);
                }
                r = call => r.unwrap_or_else(|_| Err(GenerationError::Timeout {
                    timeout_ms: u64::try_from(self.config.request_timeout.as_millis())
                        .unwrap_or(u64::MAX),
                })),
            };
            let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            let (result, findings) = match result {
                Ok(code) => {
                    transition(SessionState::Validating, index);
                    let findings = self.validator.validate(&code, &self.tokens);
                    (AttemptResult::Candidate { code }, findings)
                }
                Err(error) => {
                    tracing::warn!(attempt = index, error = %error, "Generation call failed");
                    let finding = Finding::hard_fail(
                        EMPTY_OUTPUT_RULE,
                        format!("No output was produced: {error}"),
                    );
                    (AttemptResult::TransportFailure { error }, vec![finding])
                }
            };

            tracing::info!(
                attempt = index,
                max_attempts,
                findings = findings.len(),
                elapsed_ms,
                "Attempt finished"
            );
            for finding in &findings {
                tracing::debug!(attempt = index, rule = finding.rule, message = %finding.message, "Finding");
            }

            let attempt = Attempt {
                index,
                request: request.clone(),
                result,
                findings,
                started_at,
                elapsed_ms,
            };

            if let AttemptResult::TransportFailure { error } = &attempt.result {
                let fatal = self.config.transport_failure_policy == TransportFailurePolicy::Fatal
                    || !error.is_transient();
                if fatal {
                    attempts.push(attempt);
                    return finish(session_id, OutcomeStatus::Aborted, attempts);
                }
            } else if attempt.findings.is_empty() {
                attempts.push(attempt);
                return finish(session_id, OutcomeStatus::Accepted, attempts);
            }

            if index >= max_attempts {
                attempts.push(attempt);
                return finish(session_id, OutcomeStatus::Exhausted, attempts);
            }

            transition(SessionState::Correcting, index);
            if let AttemptResult::Candidate { code } = &attempt.result {
                request = compose_correction(code, &attempt.findings, &request);
            }
            attempts.push(attempt);
        }
    }
}

fn transition(state: SessionState, attempt: u32) {
    tracing::debug!(state = ?state, attempt, "State transition");
}

fn finish(session_id: String, status: OutcomeStatus, attempts: Vec<Attempt>) -> SessionOutcome {
    let outcome = SessionOutcome::new(session_id, status, attempts);
    tracing::info!(
        status = ?outcome.status,
        success = outcome.success,
        attempts = outcome.attempts.len(),
        "Session finished"
    );
    outcome
}

impl<C> std::fmt::Debug for RetryController<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryController")
            .field("validator", &self.validator)
            .field("tokens", &self.tokens.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
