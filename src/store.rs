//! Immutable, path-addressed operations over nested form trees.
//!
//! A form tree is a [`serde_json::Value`]: leaves for user input, objects for
//! sections, arrays for repeated records or plain string lists. Every
//! operation here returns a new tree and leaves its input untouched; callers
//! holding an earlier snapshot never observe a later write. None of these
//! functions perform I/O.

use serde_json::{Map, Value};

use crate::path::{FieldPath, PathSegment, WriteTarget};

/// Resolves `path` against `tree`, returning the addressed node if present.
pub fn get<'a>(tree: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    let mut current = tree;
    for segment in path.segments() {
        match (segment, current) {
            (PathSegment::Key(key), Value::Object(map)) => current = map.get(key)?,
            (PathSegment::Index(index), Value::Array(items)) => current = items.get(*index)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Writes `value` at `path`, creating missing intermediate containers.
///
/// Key segments materialize as empty object sections, index segments as
/// arrays padded with nulls. Existing siblings are carried over unchanged.
pub fn set(tree: &Value, path: &FieldPath, value: Value) -> Value {
    if path.is_empty() {
        return value;
    }
    let mut next = tree.clone();
    write_in_place(&mut next, path.segments(), value);
    next
}

/// Dispatches a [`WriteTarget`] to the matching write shape.
pub fn apply(tree: &Value, target: &WriteTarget, value: Value) -> Value {
    match target {
        WriteTarget::Scalar(path) => set(tree, path, value),
        WriteTarget::ArrayItem { array, index, key } => {
            set_array_item(tree, array, *index, key, value)
        }
        WriteTarget::NestedScalar { section, key } => set(tree, &section.join_key(key), value),
    }
}

/// Writes `key` on the record at `index` inside the array at `array_path`.
///
/// The array is padded with empty records up to `index`; a non-object
/// element at `index` is replaced by a record before the write.
pub fn set_array_item(
    tree: &Value,
    array_path: &FieldPath,
    index: usize,
    key: &str,
    value: Value,
) -> Value {
    let mut next = tree.clone();
    let items = array_in_place(&mut next, array_path);
    if index >= items.len() {
        items.resize(index + 1, Value::Object(Map::new()));
    }
    if !items[index].is_object() {
        items[index] = Value::Object(Map::new());
    }
    if let Value::Object(record) = &mut items[index] {
        record.insert(key.to_string(), value);
    }
    next
}

/// Appends a deep-independent copy of `template` to the array at
/// `array_path`.
pub fn add_record(tree: &Value, array_path: &FieldPath, template: &Value) -> Value {
    let mut next = tree.clone();
    array_in_place(&mut next, array_path).push(template.clone());
    next
}

/// Removes exactly one record; out-of-range indices leave the tree as-is.
pub fn remove_record(tree: &Value, array_path: &FieldPath, index: usize) -> Value {
    let mut next = tree.clone();
    let items = array_in_place(&mut next, array_path);
    if index < items.len() {
        items.remove(index);
    }
    next
}

/// Appends an empty entry to a plain string-list field.
pub fn add_string(tree: &Value, array_path: &FieldPath) -> Value {
    let mut next = tree.clone();
    array_in_place(&mut next, array_path).push(Value::String(String::new()));
    next
}

/// Overwrites one entry of a plain string-list field.
///
/// Entries are stored as bare strings, never records; the list is padded
/// with empty strings up to `index`.
pub fn set_string(tree: &Value, array_path: &FieldPath, index: usize, value: &str) -> Value {
    let mut next = tree.clone();
    let items = array_in_place(&mut next, array_path);
    if index >= items.len() {
        items.resize(index + 1, Value::String(String::new()));
    }
    items[index] = Value::String(value.to_string());
    next
}

fn write_in_place(target: &mut Value, segments: &[PathSegment], value: Value) {
    let Some((segment, rest)) = segments.split_first() else {
        *target = value;
        return;
    };
    ensure_container(target, segment);
    match (segment, target) {
        (PathSegment::Key(key), Value::Object(map)) => {
            if rest.is_empty() {
                map.insert(key.clone(), value);
                return;
            }
            let entry = map
                .entry(key.clone())
                .or_insert_with(|| initial_container(rest.first()));
            if !entry.is_object() && !entry.is_array() {
                *entry = initial_container(rest.first());
            }
            write_in_place(entry, rest, value);
        }
        (PathSegment::Index(index), Value::Array(items)) => {
            if *index >= items.len() {
                items.resize(*index + 1, Value::Null);
            }
            if rest.is_empty() {
                items[*index] = value;
                return;
            }
            if !items[*index].is_object() && !items[*index].is_array() {
                items[*index] = initial_container(rest.first());
            }
            write_in_place(&mut items[*index], rest, value);
        }
        _ => unreachable!("ensure_container aligned the node with the segment"),
    }
}

/// Navigates to the array at `path` inside an already-cloned tree, creating
/// it (and missing parent sections) on demand.
fn array_in_place<'a>(root: &'a mut Value, path: &FieldPath) -> &'a mut Vec<Value> {
    let mut current = root;
    for (position, segment) in path.segments().iter().enumerate() {
        ensure_container(current, segment);
        let next_segment = path.segments().get(position + 1);
        match (segment, current) {
            (PathSegment::Key(key), Value::Object(map)) => {
                let entry = map
                    .entry(key.clone())
                    .or_insert_with(|| tail_container(next_segment));
                if !entry.is_object() && !entry.is_array() {
                    *entry = tail_container(next_segment);
                }
                current = entry;
            }
            (PathSegment::Index(index), Value::Array(items)) => {
                if *index >= items.len() {
                    items.resize(*index + 1, Value::Null);
                }
                if !items[*index].is_object() && !items[*index].is_array() {
                    items[*index] = tail_container(next_segment);
                }
                current = &mut items[*index];
            }
            _ => unreachable!("ensure_container aligned the node with the segment"),
        }
    }
    if !current.is_array() {
        *current = Value::Array(Vec::new());
    }
    match current {
        Value::Array(items) => items,
        _ => unreachable!("current was just coerced to an array"),
    }
}

fn ensure_container(target: &mut Value, segment: &PathSegment) {
    let aligned = match segment {
        PathSegment::Key(_) => target.is_object(),
        PathSegment::Index(_) => target.is_array(),
    };
    if !aligned {
        *target = initial_container(Some(segment));
    }
}

fn initial_container(segment: Option<&PathSegment>) -> Value {
    match segment {
        Some(PathSegment::Index(_)) => Value::Array(Vec::new()),
        _ => Value::Object(Map::new()),
    }
}

/// Container for the final hop of an array navigation: an array when the
/// path ends here, otherwise whatever the next segment needs.
fn tail_container(next_segment: Option<&PathSegment>) -> Value {
    match next_segment {
        None => Value::Array(Vec::new()),
        Some(segment) => initial_container(Some(segment)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_after_set_returns_the_written_value() {
        let tree = json!({});
        let path = FieldPath::parse("accidentDetails.accidentDate");
        let updated = set(&tree, &path, json!("2024-01-05"));
        assert_eq!(get(&updated, &path), Some(&json!("2024-01-05")));
    }

    #[test]
    fn set_never_mutates_the_input_tree() {
        let tree = json!({ "driver": { "name": "Ada" } });
        let before = tree.clone();
        let _ = set(&tree, &FieldPath::parse("driver.name"), json!("Grace"));
        assert_eq!(tree, before);
    }

    #[test]
    fn set_creates_missing_intermediate_sections() {
        let tree = json!({});
        let updated = set(&tree, &FieldPath::parse("driver.license.number"), json!("X1"));
        assert_eq!(
            updated,
            json!({ "driver": { "license": { "number": "X1" } } })
        );
    }

    #[test]
    fn set_preserves_sibling_branches() {
        let tree = json!({ "driver": { "name": "Ada" }, "witnesses": ["Bob"] });
        let updated = set(&tree, &FieldPath::parse("driver.phone"), json!("555"));
        assert_eq!(get(&updated, &FieldPath::parse("driver.name")), Some(&json!("Ada")));
        assert_eq!(get(&updated, &FieldPath::parse("witnesses.0")), Some(&json!("Bob")));
    }

    #[test]
    fn apply_dispatches_each_target_shape() {
        let tree = json!({});
        let tree = apply(&tree, &WriteTarget::scalar("reportNumber"), json!("R-7"));
        let tree = apply(
            &tree,
            &WriteTarget::nested_scalar("accidentDetails", "place"),
            json!("Highway 3"),
        );
        let tree = apply(
            &tree,
            &WriteTarget::array_item("otherVehicles", 0, "plate"),
            json!("AB-12-CD"),
        );
        assert_eq!(
            tree,
            json!({
                "reportNumber": "R-7",
                "accidentDetails": { "place": "Highway 3" },
                "otherVehicles": [{ "plate": "AB-12-CD" }],
            })
        );
    }

    #[test]
    fn set_array_item_pads_with_empty_records() {
        let tree = json!({ "otherVehicles": [] });
        let updated = set_array_item(
            &tree,
            &FieldPath::parse("otherVehicles"),
            2,
            "plate",
            json!("ZZ-99"),
        );
        assert_eq!(
            updated,
            json!({ "otherVehicles": [{}, {}, { "plate": "ZZ-99" }] })
        );
    }

    #[test]
    fn set_array_item_replaces_non_record_elements() {
        let tree = json!({ "otherVehicles": ["stray"] });
        let updated = set_array_item(
            &tree,
            &FieldPath::parse("otherVehicles"),
            0,
            "plate",
            json!("ZZ-99"),
        );
        assert_eq!(updated, json!({ "otherVehicles": [{ "plate": "ZZ-99" }] }));
    }

    #[test]
    fn add_then_remove_restores_the_array() {
        let tree = json!({ "injuries": [{ "person": "Ada" }] });
        let path = FieldPath::parse("injuries");
        let template = json!({ "person": "", "severity": null });

        let grown = add_record(&tree, &path, &template);
        assert_eq!(get(&grown, &path).and_then(Value::as_array).map(Vec::len), Some(2));

        let restored = remove_record(&grown, &path, 1);
        assert_eq!(restored, tree);
    }

    #[test]
    fn added_records_are_independent_of_the_template() {
        let template = json!({ "person": "" });
        let path = FieldPath::parse("injuries");
        let tree = add_record(&json!({}), &path, &template);
        let written = set_array_item(&tree, &path, 0, "person", json!("Ada"));
        assert_eq!(template, json!({ "person": "" }));
        assert_eq!(
            get(&written, &FieldPath::parse("injuries.0.person")),
            Some(&json!("Ada"))
        );
    }

    #[test]
    fn remove_out_of_range_is_a_no_op() {
        let tree = json!({ "injuries": [{ "person": "Ada" }] });
        let unchanged = remove_record(&tree, &FieldPath::parse("injuries"), 5);
        assert_eq!(unchanged, tree);
    }

    #[test]
    fn string_lists_stay_plain_strings() {
        let tree = json!({});
        let path = FieldPath::parse("witnesses");
        let tree = add_string(&tree, &path);
        let tree = set_string(&tree, &path, 0, "Bob");
        let tree = set_string(&tree, &path, 2, "Eve");
        assert_eq!(tree, json!({ "witnesses": ["Bob", "", "Eve"] }));
    }

    #[test]
    fn get_returns_none_for_type_mismatches() {
        let tree = json!({ "driver": "not-a-section" });
        assert!(get(&tree, &FieldPath::parse("driver.name")).is_none());
        assert!(get(&tree, &FieldPath::parse("missing")).is_none());
    }
}
