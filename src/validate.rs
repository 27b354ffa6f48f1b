//! Submission-time required-field validation.
//!
//! Requirements are static per schema and checked in declared order against
//! the whole tree; the first unmet rule wins and everything after it is
//! skipped, so a submission attempt surfaces at most one message.

use serde_json::Value;

use crate::path::FieldPath;
use crate::store;

/// One static requirement: which leaf must be filled, the wizard step that
/// owns it, and the label shown when it is not.
#[derive(Debug, Clone)]
pub struct RequiredFieldRule {
    pub path: FieldPath,
    pub step: usize,
    pub label: &'static str,
    /// Date leaves keep their own emptiness wording in the original forms;
    /// operationally both variants treat null, missing, and blank-after-trim
    /// input as unfilled.
    pub date_like: bool,
}

/// The first unmet requirement found during a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingField {
    pub label: String,
    pub step: usize,
}

/// Walks `rules` in declared order and reports the first unfilled leaf.
pub fn first_missing(tree: &Value, rules: &[RequiredFieldRule]) -> Option<MissingField> {
    rules
        .iter()
        .find(|rule| is_unfilled(store::get(tree, &rule.path)))
        .map(|rule| MissingField {
            label: rule.label.to_string(),
            step: rule.step,
        })
}

fn is_unfilled(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(_) => false,
    }
}
