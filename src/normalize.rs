//! Leaf normalization from UI-shaped input into an API-shaped payload.
//!
//! Form controls hand the tree loosely-typed values: numbers arrive as text,
//! booleans as text or native flags, dates as `YYYY-MM-DD` strings. The
//! submit payload is strictly typed, so every leaf the schema declares runs
//! through one transform table, and abandoned placeholder records are pruned
//! before dispatch. Unparseable input degrades to `null` instead of failing
//! the submission.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Map, Number, Value};

use crate::schema::{FieldKind, FormSchema, RecordSection};
use crate::store;

/// Normalizes a single leaf according to its semantic kind.
pub fn normalize_leaf(kind: FieldKind, value: Option<&Value>) -> Value {
    match kind {
        FieldKind::Text => normalize_text(value),
        FieldKind::Number => normalize_number(value),
        FieldKind::Checkbox => normalize_boolean(value).unwrap_or(Value::Bool(false)),
        FieldKind::TriState => normalize_boolean(value).unwrap_or(Value::Null),
        FieldKind::Date => normalize_date(value),
    }
}

/// Walks the whole tree against `schema` and assembles the payload value.
///
/// The output is schema-shaped and fully independent of the input tree.
pub fn normalize_tree(schema: &FormSchema, tree: &Value) -> Value {
    let mut payload = Value::Object(Map::new());
    for field in &schema.fields {
        let normalized = normalize_leaf(field.kind, store::get(tree, &field.path));
        payload = store::set(&payload, &field.path, normalized);
    }
    for section in &schema.record_sections {
        let records = normalize_section(section, store::get(tree, &section.path));
        payload = store::set(&payload, &section.path, records);
    }
    for list in &schema.string_lists {
        let entries = normalize_string_list(store::get(tree, &list.path));
        payload = store::set(&payload, &list.path, entries);
    }
    payload
}

/// Normalizes every record of a repeated section and drops the ones a user
/// added but never filled in.
///
/// A record survives when at least one normalized field carries content; it
/// is then kept whole, blank siblings included.
fn normalize_section(section: &RecordSection, value: Option<&Value>) -> Value {
    let Some(Value::Array(records)) = value else {
        return Value::Array(Vec::new());
    };
    let kept = records
        .iter()
        .map(|record| normalize_record(section, record))
        .filter(|record| !record_is_blank(record))
        .collect();
    Value::Array(kept)
}

fn normalize_record(section: &RecordSection, record: &Value) -> Value {
    let mut normalized = Map::new();
    for field in &section.fields {
        let raw = record.as_object().and_then(|map| map.get(field.key));
        normalized.insert(field.key.to_string(), normalize_leaf(field.kind, raw));
    }
    Value::Object(normalized)
}

/// Blank means every normalized field is null or an unticked checkbox — the
/// shape a record has when it was added and abandoned.
fn record_is_blank(record: &Value) -> bool {
    match record {
        Value::Object(map) => map
            .values()
            .all(|value| matches!(value, Value::Null | Value::Bool(false))),
        _ => true,
    }
}

fn normalize_string_list(value: Option<&Value>) -> Value {
    let Some(Value::Array(entries)) = value else {
        return Value::Array(Vec::new());
    };
    let kept = entries
        .iter()
        .filter_map(|entry| entry.as_str())
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| Value::String(entry.to_string()))
        .collect();
    Value::Array(kept)
}

fn normalize_text(value: Option<&Value>) -> Value {
    match value {
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Value::Null
            } else {
                Value::String(trimmed.to_string())
            }
        }
        Some(Value::Null) | None => Value::Null,
        Some(other) => other.clone(),
    }
}

/// Parses decimal input; blank or unparseable input becomes `null`, never 0.
fn normalize_number(value: Option<&Value>) -> Value {
    match value {
        Some(Value::Number(number)) => Value::Number(number.clone()),
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Value::Null;
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        }
        _ => Value::Null,
    }
}

/// Accepts native booleans and the strings `"true"`/`"false"`; anything else
/// is undetermined and falls back to the kind-specific blank value.
fn normalize_boolean(value: Option<&Value>) -> Option<Value> {
    match value {
        Some(Value::Bool(flag)) => Some(Value::Bool(*flag)),
        Some(Value::String(text)) => match text.trim() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

/// Re-emits a calendar date as a full ISO-8601 instant at UTC midnight.
///
/// `2024-01-05` becomes `2024-01-05T00:00:00.000Z`. Already-stamped input is
/// collapsed back to its calendar date first. Blank or unparseable input
/// becomes `null`.
fn normalize_date(value: Option<&Value>) -> Value {
    let Some(Value::String(text)) = value else {
        return Value::Null;
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    parse_calendar_date(trimmed)
        .map(|date| {
            let midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
            Value::String(midnight.to_rfc3339_opts(SecondsFormat::Millis, true))
        })
        .unwrap_or(Value::Null)
}

fn parse_calendar_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|stamp| stamp.date_naive())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, RecordField, StringListSection};
    use serde_json::json;

    #[test]
    fn numbers_parse_as_decimals() {
        assert_eq!(
            normalize_leaf(FieldKind::Number, Some(&json!("12.5"))),
            json!(12.5)
        );
        assert_eq!(
            normalize_leaf(FieldKind::Number, Some(&json!(" 40 "))),
            json!(40.0)
        );
    }

    #[test]
    fn blank_numbers_become_null_never_zero() {
        assert_eq!(normalize_leaf(FieldKind::Number, Some(&json!(""))), json!(null));
        assert_eq!(normalize_leaf(FieldKind::Number, None), json!(null));
        assert_eq!(
            normalize_leaf(FieldKind::Number, Some(&json!("fast"))),
            json!(null)
        );
    }

    #[test]
    fn booleans_accept_native_and_text_forms() {
        assert_eq!(
            normalize_leaf(FieldKind::Checkbox, Some(&json!("true"))),
            json!(true)
        );
        assert_eq!(
            normalize_leaf(FieldKind::Checkbox, Some(&json!(false))),
            json!(false)
        );
        assert_eq!(
            normalize_leaf(FieldKind::TriState, Some(&json!("false"))),
            json!(false)
        );
    }

    #[test]
    fn blank_booleans_depend_on_the_control_kind() {
        assert_eq!(normalize_leaf(FieldKind::Checkbox, Some(&json!(""))), json!(false));
        assert_eq!(normalize_leaf(FieldKind::Checkbox, None), json!(false));
        assert_eq!(normalize_leaf(FieldKind::TriState, Some(&json!(""))), json!(null));
        assert_eq!(normalize_leaf(FieldKind::TriState, None), json!(null));
    }

    #[test]
    fn dates_become_utc_midnight_instants() {
        assert_eq!(
            normalize_leaf(FieldKind::Date, Some(&json!("2024-01-05"))),
            json!("2024-01-05T00:00:00.000Z")
        );
    }

    #[test]
    fn stamped_dates_collapse_to_their_calendar_day() {
        assert_eq!(
            normalize_leaf(FieldKind::Date, Some(&json!("2024-01-05T09:30:00+02:00"))),
            json!("2024-01-05T00:00:00.000Z")
        );
    }

    #[test]
    fn bad_dates_degrade_to_null_without_panicking() {
        assert_eq!(normalize_leaf(FieldKind::Date, Some(&json!(""))), json!(null));
        assert_eq!(normalize_leaf(FieldKind::Date, Some(&json!("  "))), json!(null));
        assert_eq!(
            normalize_leaf(FieldKind::Date, Some(&json!("05/01/2024"))),
            json!(null)
        );
    }

    #[test]
    fn strings_trim_and_blank_out_to_null() {
        assert_eq!(
            normalize_leaf(FieldKind::Text, Some(&json!("  Ada  "))),
            json!("Ada")
        );
        assert_eq!(normalize_leaf(FieldKind::Text, Some(&json!("   "))), json!(null));
    }

    fn section() -> RecordSection {
        RecordSection::new(
            "otherVehicles",
            2,
            vec![
                RecordField::new("plate", "Plate", FieldKind::Text),
                RecordField::new("speed", "Speed", FieldKind::Number),
                RecordField::new("fled", "Fled the scene", FieldKind::Checkbox),
            ],
        )
    }

    #[test]
    fn abandoned_records_are_pruned() {
        let value = json!([
            { "plate": "AB-12", "speed": "50", "fled": false },
            { "plate": "", "speed": "", "fled": false },
        ]);
        let normalized = normalize_section(&section(), Some(&value));
        assert_eq!(
            normalized,
            json!([{ "plate": "AB-12", "speed": 50.0, "fled": false }])
        );
    }

    #[test]
    fn one_filled_field_keeps_the_whole_record() {
        let value = json!([{ "plate": "", "speed": "30", "fled": false }]);
        let normalized = normalize_section(&section(), Some(&value));
        assert_eq!(
            normalized,
            json!([{ "plate": null, "speed": 30.0, "fled": false }])
        );
    }

    #[test]
    fn explicit_zero_keeps_a_record() {
        let value = json!([{ "plate": "", "speed": "0", "fled": false }]);
        let normalized = normalize_section(&section(), Some(&value));
        assert_eq!(
            normalized,
            json!([{ "plate": null, "speed": 0.0, "fled": false }])
        );
    }

    #[test]
    fn normalize_tree_assembles_a_schema_shaped_payload() {
        let schema = FormSchema::new(
            "accident-report",
            3,
            vec![
                FieldSpec::new("driver.name", "Driver name", FieldKind::Text, 1),
                FieldSpec::new("accidentDetails.accidentDate", "Accident date", FieldKind::Date, 2),
                FieldSpec::new("accidentDetails.speed", "Speed", FieldKind::Number, 2),
                FieldSpec::new("policeNotified", "Police notified", FieldKind::Checkbox, 3),
            ],
            vec![section()],
            vec![StringListSection::new("witnesses", 3)],
        );
        let tree = json!({
            "driver": { "name": " Ada " },
            "accidentDetails": { "accidentDate": "2024-01-05", "speed": "" },
            "policeNotified": "true",
            "otherVehicles": [{ "plate": "AB-12", "speed": "", "fled": false }],
            "witnesses": ["  Bob ", "", "Eve"],
        });
        assert_eq!(
            normalize_tree(&schema, &tree),
            json!({
                "driver": { "name": "Ada" },
                "accidentDetails": {
                    "accidentDate": "2024-01-05T00:00:00.000Z",
                    "speed": null,
                },
                "policeNotified": true,
                "otherVehicles": [{ "plate": "AB-12", "speed": null, "fled": false }],
                "witnesses": ["Bob", "Eve"],
            })
        );
    }
}
