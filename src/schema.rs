//! Intake scripts
//!
//! An intake script is the per-variant schema: the ordered list of fields a
//! conversation must collect, plus the greeting, skip words, and persistence
//! policy. Variants (coffee order, wellness check-in) are script files, not
//! code.

use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::{Error, Result};

/// How a field accepts values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Single string value; a later utterance overwrites an earlier one
    Scalar,
    /// Ordered list of strings; utterances append until a skip word closes it
    List,
}

/// One named unit of information the dialogue must collect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Unique key, used in the persisted record
    pub name: String,

    /// Display name, used in rendered summaries
    pub label: String,

    /// Fill rule
    pub kind: FieldKind,

    /// The question spoken when this field is the cursor
    pub prompt: String,
}

/// When completed (or partial) records are written to the log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistPolicy {
    /// Append once, when the record completes
    #[default]
    OnCompletion,
    /// Append after every accepted field write; the write that completes the
    /// record is covered by the completion append
    EveryStep,
}

fn default_skip_words() -> Vec<String> {
    vec!["no".to_string(), "none".to_string()]
}

/// A complete conversation variant: ordered fields plus session texts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeScript {
    /// Script identifier (also names the log file)
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// Spoken once at session start, before the first prompt
    pub greeting: String,

    /// Spoken after the completion summary
    #[serde(default)]
    pub farewell: Option<String>,

    /// Include the previous session's summary in the greeting
    #[serde(default)]
    pub recall_last: bool,

    /// Utterances that close a list field instead of being appended
    #[serde(default = "default_skip_words")]
    pub skip_words: Vec<String>,

    /// Persistence policy
    #[serde(default)]
    pub persist: PersistPolicy,

    /// Ordered fill sequence; order is the tie-break for "first missing"
    pub fields: Vec<FieldSpec>,
}

impl IntakeScript {
    /// Parse a script from JSON and validate it
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed or the script is invalid
    pub fn from_json(json: &str) -> Result<Self> {
        let script: Self = serde_json::from_str(json)?;
        script.validate()?;
        Ok(script)
    }

    /// Check script invariants: a non-empty id, at least one field, unique
    /// non-empty field names
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the first violation found
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Config("script id must not be empty".to_string()));
        }

        if self.fields.is_empty() {
            return Err(Error::Config(format!(
                "script '{}' has no fields",
                self.id
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(Error::Config(format!(
                    "script '{}' has a field with an empty name",
                    self.id
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(Error::Config(format!(
                    "script '{}' has duplicate field '{}'",
                    self.id, field.name
                )));
            }
        }

        // A list field can only close via a skip word
        let has_list = self.fields.iter().any(|f| f.kind == FieldKind::List);
        if has_list && self.skip_words.is_empty() {
            return Err(Error::Config(format!(
                "script '{}' has list fields but no skip words",
                self.id
            )));
        }

        Ok(())
    }

    /// Whether an utterance is a skip word (trimmed, case-insensitive)
    #[must_use]
    pub fn is_skip_word(&self, utterance: &str) -> bool {
        let text = utterance.trim();
        self.skip_words
            .iter()
            .any(|w| w.eq_ignore_ascii_case(text))
    }

    /// First field (schema order) still awaiting a value, or `None` when the
    /// record is complete. This is the single authoritative "what's next"
    /// decision; no other component reorders or skips fields.
    #[must_use]
    pub fn first_missing<'a>(&'a self, record: &Record) -> Option<(usize, &'a FieldSpec)> {
        self.fields
            .iter()
            .enumerate()
            .find(|&(idx, _)| !record.is_settled(idx))
    }

    /// File name of this script's record log
    #[must_use]
    pub fn log_file_name(&self) -> String {
        format!("{}_log.json", self.id)
    }
}
