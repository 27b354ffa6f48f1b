//! Declarative form schemas.
//!
//! A [`FormSchema`] describes one report type: its scalar fields, repeated
//! record sections, plain string lists, and how many wizard steps the form
//! spans. Schemas are pure data — the same description drives the empty-tree
//! template, the required-field rules, and the normalization walk, so the
//! per-provider wizards differ only in what they declare here.

use serde_json::{Map, Value};

use crate::errors::{ClaimsError, Result};
use crate::path::FieldPath;
use crate::store;
use crate::validate::RequiredFieldRule;

/// Semantic kind of a leaf, driving empty-tree defaults and normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    /// Two-state checkbox; an untouched control persists as `false`.
    Checkbox,
    /// Three-state flag; an untouched control persists as `null`.
    TriState,
    Date,
}

impl FieldKind {
    /// The value a fresh tree carries for a leaf of this kind.
    pub fn empty_value(self) -> Value {
        match self {
            FieldKind::Text | FieldKind::Date => Value::String(String::new()),
            FieldKind::Number | FieldKind::TriState => Value::Null,
            FieldKind::Checkbox => Value::Bool(false),
        }
    }
}

/// Declarative description of a single scalar leaf.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub path: FieldPath,
    pub label: &'static str,
    pub kind: FieldKind,
    /// Wizard step that renders this field.
    pub step: usize,
    pub required: bool,
}

impl FieldSpec {
    pub fn new(
        path: impl Into<FieldPath>,
        label: &'static str,
        kind: FieldKind,
        step: usize,
    ) -> Self {
        Self {
            path: path.into(),
            label,
            kind,
            step,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// One field of a repeated record.
#[derive(Debug, Clone)]
pub struct RecordField {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

impl RecordField {
    pub fn new(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { key, label, kind }
    }
}

/// A repeated sub-form section: witnesses, other vehicles, passengers, …
///
/// Records have no identity beyond their current index; add/remove is
/// positional.
#[derive(Debug, Clone)]
pub struct RecordSection {
    pub path: FieldPath,
    pub step: usize,
    pub fields: Vec<RecordField>,
}

impl RecordSection {
    pub fn new(path: impl Into<FieldPath>, step: usize, fields: Vec<RecordField>) -> Self {
        Self {
            path: path.into(),
            step,
            fields,
        }
    }

    /// Fresh record template with every field at its empty value.
    pub fn empty_record(&self) -> Value {
        let mut record = Map::new();
        for field in &self.fields {
            record.insert(field.key.to_string(), field.kind.empty_value());
        }
        Value::Object(record)
    }
}

/// A plain list of free-text entries (witness names and the like).
#[derive(Debug, Clone)]
pub struct StringListSection {
    pub path: FieldPath,
    pub step: usize,
}

impl StringListSection {
    pub fn new(path: impl Into<FieldPath>, step: usize) -> Self {
        Self {
            path: path.into(),
            step,
        }
    }
}

/// Complete description of one report type.
#[derive(Debug, Clone)]
pub struct FormSchema {
    pub name: &'static str,
    /// Number of wizard steps; positions run `1..=steps`.
    pub steps: usize,
    pub fields: Vec<FieldSpec>,
    pub record_sections: Vec<RecordSection>,
    pub string_lists: Vec<StringListSection>,
}

impl FormSchema {
    pub fn new(
        name: &'static str,
        steps: usize,
        fields: Vec<FieldSpec>,
        record_sections: Vec<RecordSection>,
        string_lists: Vec<StringListSection>,
    ) -> Self {
        Self {
            name,
            steps,
            fields,
            record_sections,
            string_lists,
        }
    }

    /// Checks the declaration for mistakes a wizard author could make:
    /// out-of-range steps, empty paths, duplicate addresses.
    pub fn validate(&self) -> Result<()> {
        if self.steps == 0 {
            return Err(ClaimsError::InvalidSchema(format!(
                "`{}` declares zero wizard steps",
                self.name
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            self.check_placement(&field.path, field.step)?;
            if !seen.insert(field.path.clone()) {
                return Err(ClaimsError::InvalidSchema(format!(
                    "`{}` declares `{}` twice",
                    self.name, field.path
                )));
            }
        }
        for section in &self.record_sections {
            self.check_placement(&section.path, section.step)?;
            if section.fields.is_empty() {
                return Err(ClaimsError::InvalidSchema(format!(
                    "record section `{}` has no fields",
                    section.path
                )));
            }
            if !seen.insert(section.path.clone()) {
                return Err(ClaimsError::InvalidSchema(format!(
                    "`{}` declares `{}` twice",
                    self.name, section.path
                )));
            }
        }
        for list in &self.string_lists {
            self.check_placement(&list.path, list.step)?;
            if !seen.insert(list.path.clone()) {
                return Err(ClaimsError::InvalidSchema(format!(
                    "`{}` declares `{}` twice",
                    self.name, list.path
                )));
            }
        }
        Ok(())
    }

    fn check_placement(&self, path: &FieldPath, step: usize) -> Result<()> {
        if path.is_empty() {
            return Err(ClaimsError::InvalidSchema(format!(
                "`{}` declares a field with an empty path",
                self.name
            )));
        }
        if step == 0 || step > self.steps {
            return Err(ClaimsError::InvalidSchema(format!(
                "`{}` places `{}` on step {} of {}",
                self.name, path, step, self.steps
            )));
        }
        Ok(())
    }

    /// Builds a fresh, fully-independent copy of the canonical empty tree.
    ///
    /// Every leaf is materialized explicitly — text and date leaves as empty
    /// strings, numbers and tri-state flags as nulls, checkboxes as `false`,
    /// repeated sections as empty arrays — so no session ever aliases the
    /// template or another session's tree.
    pub fn empty_tree(&self) -> Value {
        let mut tree = Value::Object(Map::new());
        for field in &self.fields {
            tree = store::set(&tree, &field.path, field.kind.empty_value());
        }
        for section in &self.record_sections {
            tree = store::set(&tree, &section.path, Value::Array(Vec::new()));
        }
        for list in &self.string_lists {
            tree = store::set(&tree, &list.path, Value::Array(Vec::new()));
        }
        tree
    }

    /// Required-field rules in declaration order.
    pub fn required_rules(&self) -> Vec<RequiredFieldRule> {
        self.fields
            .iter()
            .filter(|field| field.required)
            .map(|field| RequiredFieldRule {
                path: field.path.clone(),
                step: field.step,
                label: field.label,
                date_like: field.kind == FieldKind::Date,
            })
            .collect()
    }

    /// Looks up a record section by its array path.
    pub fn record_section(&self, path: &FieldPath) -> Option<&RecordSection> {
        self.record_sections
            .iter()
            .find(|section| &section.path == path)
    }
}
