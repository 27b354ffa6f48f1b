#![allow(dead_code)]

//! Shared fixtures for the engine integration suites: a representative
//! accident-report schema, a scripted submit backend, and a recording
//! observer.

use std::collections::VecDeque;

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use claims_core::schema::{
    FieldKind, FieldSpec, FormSchema, RecordField, RecordSection, StringListSection,
};
use claims_core::session::Liveness;
use claims_core::submit::{SubmitBackend, SubmitError, SubmissionObserver};

/// Five-step accident report, shaped like the provider wizards: driver data
/// first, accident details in the middle, repeated sections near the end.
pub fn accident_report_schema() -> FormSchema {
    FormSchema::new(
        "accident-report",
        5,
        vec![
            FieldSpec::new("driver.name", "Driver name", FieldKind::Text, 1).required(),
            FieldSpec::new("driver.licenseNumber", "License number", FieldKind::Text, 1),
            FieldSpec::new("accidentDetails.place", "Accident place", FieldKind::Text, 2),
            FieldSpec::new(
                "accidentDetails.estimatedSpeed",
                "Estimated speed",
                FieldKind::Number,
                2,
            ),
            FieldSpec::new(
                "accidentDetails.accidentDate",
                "Accident date",
                FieldKind::Date,
                3,
            )
            .required(),
            FieldSpec::new(
                "accidentDetails.policeNotified",
                "Police notified",
                FieldKind::Checkbox,
                3,
            ),
            FieldSpec::new(
                "accidentDetails.injuriesReported",
                "Injuries reported",
                FieldKind::TriState,
                4,
            ),
        ],
        vec![RecordSection::new(
            "otherVehicles",
            4,
            vec![
                RecordField::new("plate", "Plate", FieldKind::Text),
                RecordField::new("driverName", "Driver name", FieldKind::Text),
                RecordField::new("insurer", "Insurer", FieldKind::Text),
            ],
        )],
        vec![StringListSection::new("witnesses", 4)],
    )
}

pub static ACCIDENT_REPORT: Lazy<FormSchema> = Lazy::new(accident_report_schema);

/// Submit backend driven by a queue of scripted responses; records every
/// payload it receives.
pub struct ScriptedBackend {
    responses: VecDeque<Result<Value, SubmitError>>,
    pub calls: Vec<(Value, String)>,
    /// When set, revoked during `submit` to simulate the hosting modal being
    /// torn down while the call is out.
    pub revoke_mid_flight: Option<Liveness>,
}

impl ScriptedBackend {
    pub fn accepting() -> Self {
        Self {
            responses: VecDeque::new(),
            calls: Vec::new(),
            revoke_mid_flight: None,
        }
    }

    pub fn scripted(responses: Vec<Result<Value, SubmitError>>) -> Self {
        Self {
            responses: responses.into(),
            calls: Vec::new(),
            revoke_mid_flight: None,
        }
    }
}

impl SubmitBackend for ScriptedBackend {
    fn submit(&mut self, payload: &Value, foreign_key: &str) -> Result<Value, SubmitError> {
        self.calls.push((payload.clone(), foreign_key.to_string()));
        if let Some(liveness) = &self.revoke_mid_flight {
            liveness.revoke();
        }
        self.responses
            .pop_front()
            .unwrap_or_else(|| Ok(json!({ "id": self.calls.len() })))
    }
}

/// Observer that records every message and refresh callback it receives.
#[derive(Default)]
pub struct RecordingObserver {
    pub errors: Vec<String>,
    pub successes: Vec<String>,
    pub refreshed: Vec<Value>,
}

impl SubmissionObserver for RecordingObserver {
    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn show_success(&mut self, message: &str) {
        self.successes.push(message.to_string());
    }

    fn submitted(&mut self, result: &Value) {
        self.refreshed.push(result.clone());
    }
}
