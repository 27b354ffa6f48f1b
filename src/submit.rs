//! Submission orchestration: guards, validation, normalization, dispatch.
//!
//! The coordinator owns the order of operations around a submit attempt.
//! Each stage is a hard gate on the next: a missing target id stops
//! everything, a failed required-field check jumps the wizard and stops
//! before any payload is built, and only a fully-normalized payload reaches
//! the backend. Failures are classified into a fixed taxonomy and surfaced
//! as exactly one user-facing message; the underlying error is logged, never
//! rethrown into the session.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::normalize;
use crate::session::FormSession;
use crate::validate::{self, MissingField};

/// Structured failure returned by a submit collaborator, carrying an
/// optional HTTP-like status.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct SubmitError {
    pub status: Option<u16>,
    pub message: String,
}

impl SubmitError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// A transport-level failure that never reached the service.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }
}

/// External service that persists a finished report payload.
///
/// Implementations own transport and authentication; the engine only hands
/// them the payload and the id of the entity it attaches to.
pub trait SubmitBackend {
    fn submit(&mut self, payload: &Value, foreign_key: &str) -> Result<Value, SubmitError>;
}

/// Supplies user-facing copy. Consulted for messages only, never for
/// control flow.
pub trait Localizer {
    /// Returns the copy registered under `key`, falling back to `fallback`.
    /// `{name}`-style placeholders are substituted from `params`.
    fn text(&self, key: &str, fallback: &str, params: &[(&str, String)]) -> String;
}

/// Default localizer: returns the fallback copy with placeholders applied.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackLocale;

impl Localizer for FallbackLocale {
    fn text(&self, _key: &str, fallback: &str, params: &[(&str, String)]) -> String {
        substitute(fallback, params)
    }
}

/// Replaces `{name}` placeholders in `template` from `params`.
pub fn substitute(template: &str, params: &[(&str, String)]) -> String {
    let mut text = template.to_string();
    for (name, value) in params {
        text = text.replace(&format!("{{{}}}", name), value);
    }
    text
}

/// Caller-side surface notified about submission outcomes.
///
/// The engine promises at most one message per attempt; `submitted` fires
/// once per accepted payload so the caller can refresh its own lists.
pub trait SubmissionObserver {
    fn show_error(&mut self, message: &str);
    fn show_success(&mut self, message: &str);
    fn submitted(&mut self, result: &Value);
}

/// Fixed classification of submit-collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The record being written no longer exists on the server.
    ResourceNotFound,
    /// A related entity the report attaches to (the vehicle, the policy) is
    /// missing.
    DependencyNotFound,
    /// Duplicate or already-exists.
    Conflict,
    /// The server rejected the payload and said why; its text is passed
    /// through.
    BadRequest { server_message: String },
    /// The request never reached the service.
    NetworkUnavailable,
    Unknown,
}

/// Maps a backend error onto the taxonomy.
///
/// Both not-found cases arrive as 404s; the server message is checked for
/// the dependent entity's name to tell them apart.
pub fn classify(error: &SubmitError, dependency_entity: &str) -> FailureKind {
    match error.status {
        None => FailureKind::NetworkUnavailable,
        Some(404) => {
            let message = error.message.to_lowercase();
            if !dependency_entity.is_empty() && message.contains(&dependency_entity.to_lowercase())
            {
                FailureKind::DependencyNotFound
            } else {
                FailureKind::ResourceNotFound
            }
        }
        Some(409) => FailureKind::Conflict,
        Some(400) => FailureKind::BadRequest {
            server_message: error.message.clone(),
        },
        Some(_) => FailureKind::Unknown,
    }
}

/// Result of one submission attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// An earlier attempt is still in flight for this session.
    AlreadyInFlight,
    /// The target-entity id was absent; nothing else ran.
    MissingForeignKey,
    /// A required field was empty; the wizard jumped to its step.
    Invalid(MissingField),
    /// The backend accepted the payload.
    Submitted,
    /// The backend rejected the payload.
    Rejected(FailureKind),
    /// The session was closed while the call was in flight; the result was
    /// discarded without touching session state.
    Discarded,
}

/// Drives the submit sequence for one session at a time.
pub struct SubmissionCoordinator<L: Localizer = FallbackLocale> {
    localizer: L,
    /// Entity name used in 404 disambiguation and in user-facing copy.
    dependency_entity: String,
    auto_close_delay: Duration,
}

impl SubmissionCoordinator<FallbackLocale> {
    pub fn new(dependency_entity: impl Into<String>) -> Self {
        Self::with_localizer(dependency_entity, FallbackLocale)
    }
}

impl<L: Localizer> SubmissionCoordinator<L> {
    pub fn with_localizer(dependency_entity: impl Into<String>, localizer: L) -> Self {
        Self {
            localizer,
            dependency_entity: dependency_entity.into(),
            auto_close_delay: Duration::from_millis(1200),
        }
    }

    /// Overrides the close-after-success delay armed on the session.
    pub fn auto_close_delay(mut self, delay: Duration) -> Self {
        self.auto_close_delay = delay;
        self
    }

    /// Runs one submission attempt end to end.
    pub fn submit<B, O>(
        &self,
        session: &mut FormSession<'_>,
        backend: &mut B,
        observer: &mut O,
    ) -> SubmissionOutcome
    where
        B: SubmitBackend,
        O: SubmissionObserver,
    {
        if session.is_submitting() {
            debug!(session = %session.id(), "submission already in flight, ignoring");
            return SubmissionOutcome::AlreadyInFlight;
        }

        let Some(foreign_key) = session.foreign_key().map(str::to_string) else {
            warn!(session = %session.id(), "submission without a target entity id");
            let message = self.localizer.text(
                "submit.missing_target",
                "No {entity} is selected for this report.",
                &[("entity", self.dependency_entity.clone())],
            );
            observer.show_error(&message);
            return SubmissionOutcome::MissingForeignKey;
        };

        let rules = session.schema().required_rules();
        if let Some(missing) = validate::first_missing(session.tree(), &rules) {
            debug!(
                session = %session.id(),
                field = %missing.label,
                step = missing.step,
                "required field unfilled"
            );
            session.jump_to_step(missing.step);
            let message = self.localizer.text(
                "submit.required_field",
                "{field} is required.",
                &[("field", missing.label.clone())],
            );
            observer.show_error(&message);
            return SubmissionOutcome::Invalid(missing);
        }

        let payload = normalize::normalize_tree(session.schema(), session.tree());

        session.set_submitting(true);
        let liveness = session.liveness();
        let result = backend.submit(&payload, &foreign_key);

        // The hosting modal may have been torn down while the call was out;
        // a dead session's state must not be touched.
        if !liveness.is_live() {
            debug!(session = %session.id(), "session closed mid-flight, result discarded");
            return SubmissionOutcome::Discarded;
        }
        session.set_submitting(false);

        match result {
            Ok(result) => {
                info!(session = %session.id(), form = session.schema().name, "report submitted");
                let message = self.localizer.text(
                    "submit.success",
                    "The report was saved successfully.",
                    &[],
                );
                observer.show_success(&message);
                observer.submitted(&result);
                session.arm_auto_close(self.auto_close_delay);
                SubmissionOutcome::Submitted
            }
            Err(error) => {
                let kind = classify(&error, &self.dependency_entity);
                warn!(
                    session = %session.id(),
                    status = ?error.status,
                    error = %error,
                    "submission rejected"
                );
                let message = self.failure_message(&kind);
                observer.show_error(&message);
                SubmissionOutcome::Rejected(kind)
            }
        }
    }

    fn failure_message(&self, kind: &FailureKind) -> String {
        let entity = ("entity", self.dependency_entity.clone());
        match kind {
            FailureKind::ResourceNotFound => self.localizer.text(
                "submit.not_found",
                "The requested record no longer exists.",
                &[],
            ),
            FailureKind::DependencyNotFound => self.localizer.text(
                "submit.dependency_missing",
                "The linked {entity} could not be found.",
                &[entity],
            ),
            FailureKind::Conflict => self.localizer.text(
                "submit.conflict",
                "A report already exists for this {entity}.",
                &[entity],
            ),
            FailureKind::BadRequest { server_message } => server_message.clone(),
            FailureKind::NetworkUnavailable => self.localizer.text(
                "submit.offline",
                "The service is unreachable. Check your connection and try again.",
                &[],
            ),
            FailureKind::Unknown => self.localizer.text(
                "submit.unknown",
                "Something went wrong while saving. Please try again.",
                &[],
            ),
        }
    }
}
