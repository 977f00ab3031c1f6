//! Intake records
//!
//! A record is the mutable answer set for one session. Its keys are exactly
//! the script's field names, enforced by construction; there is no access by
//! reflection, only by schema index.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::schema::{FieldKind, IntakeScript};

/// Value rendered for an empty field in summaries
const EMPTY_RENDERING: &str = "None";

/// The value of one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Single string; `None` until first written
    Scalar(Option<String>),
    /// Ordered strings; `closed` once the skip word has been heard
    List { items: Vec<String>, closed: bool },
}

impl FieldValue {
    fn new(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Scalar => Self::Scalar(None),
            FieldKind::List => Self::List {
                items: Vec::new(),
                closed: false,
            },
        }
    }

    /// Whether the field holds no data (a closed empty list is still empty)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Scalar(value) => value.is_none(),
            Self::List { items, .. } => items.is_empty(),
        }
    }

    /// Whether the cursor is done with this field: a written scalar, or a
    /// closed list
    #[must_use]
    pub fn is_settled(&self) -> bool {
        match self {
            Self::Scalar(value) => value.is_some(),
            Self::List { closed, .. } => *closed,
        }
    }

    /// Render for summaries: the value, list items joined by `", "`, or
    /// `"None"` when empty
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Scalar(Some(value)) => value.clone(),
            Self::Scalar(None) => EMPTY_RENDERING.to_string(),
            Self::List { items, .. } => {
                if items.is_empty() {
                    EMPTY_RENDERING.to_string()
                } else {
                    items.join(", ")
                }
            }
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Scalar(value) => Value::String(value.clone().unwrap_or_default()),
            Self::List { items, .. } => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

/// The structured answer set for one session
#[derive(Debug, Clone)]
pub struct Record {
    script: Arc<IntakeScript>,
    values: Vec<FieldValue>,
    started_at: DateTime<Utc>,
}

impl Record {
    /// Create a fresh, fully-empty record for a script
    #[must_use]
    pub fn new(script: Arc<IntakeScript>) -> Self {
        let values = script
            .fields
            .iter()
            .map(|f| FieldValue::new(f.kind))
            .collect();

        Self {
            script,
            values,
            started_at: Utc::now(),
        }
    }

    /// The script this record was built from
    #[must_use]
    pub fn script(&self) -> &IntakeScript {
        &self.script
    }

    /// Session start timestamp
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Look up a field's value by name
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.script
            .fields
            .iter()
            .position(|f| f.name == name)
            .map(|idx| &self.values[idx])
    }

    /// Whether the cursor is done with the field at `idx`
    #[must_use]
    pub fn is_settled(&self, idx: usize) -> bool {
        self.values[idx].is_settled()
    }

    /// Write an utterance into the field at `idx`: overwrite for scalars
    /// (last write wins), append for lists. The utterance is trimmed; no
    /// other validation or coercion is applied.
    pub fn write(&mut self, idx: usize, utterance: &str) {
        let text = utterance.trim().to_string();
        match &mut self.values[idx] {
            FieldValue::Scalar(value) => *value = Some(text),
            FieldValue::List { items, .. } => items.push(text),
        }
    }

    /// Close the list field at `idx` so the cursor can move on. No-op for
    /// scalar fields.
    pub fn close_list(&mut self, idx: usize) {
        if let FieldValue::List { closed, .. } = &mut self.values[idx] {
            *closed = true;
        }
    }

    /// Whether every field is settled
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.script.first_missing(self).is_none()
    }

    /// Render the summary from current values. Recomputed on every call,
    /// never cached.
    #[must_use]
    pub fn summary(&self) -> String {
        self.script
            .fields
            .iter()
            .zip(&self.values)
            .map(|(field, value)| format!("{}: {}", field.label, value.render()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The persisted shape: one key per field (scalar → string, list →
    /// array of strings) plus `summary` and `date`
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut entry = serde_json::Map::new();
        for (field, value) in self.script.fields.iter().zip(&self.values) {
            entry.insert(field.name.clone(), value.to_json());
        }
        entry.insert("summary".to_string(), Value::String(self.summary()));
        entry.insert(
            "date".to_string(),
            Value::String(self.started_at.to_rfc3339()),
        );
        Value::Object(entry)
    }
}
