//! One open wizard instance and its working state.
//!
//! A session is created when the hosting modal opens, mutated by user input
//! and step navigation, and discarded — without side effects — when the
//! modal closes or a submission succeeds. Sessions never share state with
//! each other; the only thing that outlives a session is the [`Liveness`]
//! token handed to in-flight submissions so a late result can be discarded
//! instead of mutating dead state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::path::{FieldPath, WriteTarget};
use crate::schema::FormSchema;
use crate::steps::StepController;
use crate::store;

/// Shared flag telling an in-flight submission whether its session still
/// exists.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Marks the session as dead for anyone still holding this token.
    ///
    /// [`FormSession::close`] calls this; hosts that tear the modal down
    /// while a submit call is out revoke the token they kept.
    pub fn revoke(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Working state of one open wizard.
pub struct FormSession<'s> {
    id: Uuid,
    schema: &'s FormSchema,
    tree: Value,
    steps: StepController,
    submitting: bool,
    foreign_key: Option<String>,
    liveness: Liveness,
    pending_close: Option<Duration>,
}

impl<'s> FormSession<'s> {
    /// Opens a session on a fresh copy of the schema's empty template at
    /// step 1.
    ///
    /// `foreign_key` is the id of the entity the finished report attaches to
    /// (a vehicle, a policy); it is supplied by the caller before the modal
    /// opens and its absence is surfaced at submission time, never resolved
    /// here.
    pub fn open(schema: &'s FormSchema, foreign_key: Option<String>) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            schema,
            tree: schema.empty_tree(),
            steps: StepController::new(schema.steps),
            submitting: false,
            foreign_key,
            liveness: Liveness::new(),
            pending_close: None,
        };
        debug!(session = %session.id, form = schema.name, "form session opened");
        session
    }

    /// Resets to the canonical empty state, irrespective of what happened in
    /// this session so far.
    ///
    /// The previous liveness token is revoked first, so a submission still
    /// in flight against the old state cannot touch the new one.
    pub fn reset(&mut self) {
        self.liveness.revoke();
        self.liveness = Liveness::new();
        self.tree = self.schema.empty_tree();
        self.steps.reset();
        self.submitting = false;
        self.pending_close = None;
    }

    /// Discards the session. No side effects beyond revoking liveness.
    pub fn close(&mut self) {
        self.liveness.revoke();
        self.pending_close = None;
        debug!(session = %self.id, "form session closed");
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn schema(&self) -> &'s FormSchema {
        self.schema
    }

    pub fn tree(&self) -> &Value {
        &self.tree
    }

    pub fn foreign_key(&self) -> Option<&str> {
        self.foreign_key.as_deref()
    }

    pub fn is_live(&self) -> bool {
        self.liveness.is_live()
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub(crate) fn set_submitting(&mut self, submitting: bool) {
        self.submitting = submitting;
    }

    // --- step navigation -------------------------------------------------

    pub fn current_step(&self) -> usize {
        self.steps.current()
    }

    pub fn is_terminal_step(&self) -> bool {
        self.steps.is_terminal()
    }

    pub fn next_step(&mut self) {
        self.steps.next();
    }

    pub fn back_step(&mut self) {
        self.steps.back();
    }

    pub fn jump_to_step(&mut self, step: usize) {
        self.steps.jump_to(step);
    }

    // --- tree access -----------------------------------------------------

    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        store::get(&self.tree, path)
    }

    /// Writes one value through a [`WriteTarget`]; the previous tree value
    /// is replaced wholesale, never mutated.
    pub fn write(&mut self, target: &WriteTarget, value: Value) {
        self.tree = store::apply(&self.tree, target, value);
    }

    /// Appends a fresh record to a repeated section, using the section's
    /// declared template.
    pub fn add_record(&mut self, array_path: &FieldPath) {
        if let Some(section) = self.schema.record_section(array_path) {
            self.tree = store::add_record(&self.tree, array_path, &section.empty_record());
        }
    }

    pub fn remove_record(&mut self, array_path: &FieldPath, index: usize) {
        self.tree = store::remove_record(&self.tree, array_path, index);
    }

    pub fn add_string(&mut self, array_path: &FieldPath) {
        self.tree = store::add_string(&self.tree, array_path);
    }

    pub fn set_string(&mut self, array_path: &FieldPath, index: usize, value: &str) {
        self.tree = store::set_string(&self.tree, array_path, index, value);
    }

    // --- post-success auto-close -----------------------------------------

    /// Arms the close-after-success delay. The hosting event loop honours it
    /// by calling [`FormSession::close`] once the delay elapses.
    pub(crate) fn arm_auto_close(&mut self, delay: Duration) {
        self.pending_close = Some(delay);
    }

    pub fn pending_close(&self) -> Option<Duration> {
        self.pending_close
    }

    /// Cancels a pending auto-close, keeping the session open.
    pub fn cancel_pending_close(&mut self) {
        self.pending_close = None;
    }
}
