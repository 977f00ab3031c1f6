//! Slot-filling dialogue engine
//!
//! The engine owns the current record and a cursor naming the field being
//! asked about. Each accepted utterance fills the cursor field; the first
//! still-missing field (schema order) becomes the next cursor. When nothing
//! is missing the record is persisted, summarized, and replaced by a fresh
//! one — the engine never terminates, it cycles.

use std::sync::Arc;

use serde_json::Value;

use crate::record::Record;
use crate::schema::{FieldKind, FieldSpec, IntakeScript, PersistPolicy};
use crate::store::IntakeStore;
use crate::{Error, Result};

/// Outcome of one turn
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    /// The next question to speak
    Prompt {
        /// Name of the field the engine is now awaiting
        field: String,
        /// Question text
        text: String,
    },
    /// All fields are filled; the record has been persisted and the engine
    /// has reset for the next session
    Completion {
        /// Rendered one-line summary
        summary: String,
        /// Full spoken reply (summary plus the script's farewell)
        reply: String,
        /// The entry that was written to the log
        record: Value,
    },
}

impl Turn {
    /// Text to speak back for this turn
    #[must_use]
    pub fn reply(&self) -> &str {
        match self {
            Self::Prompt { text, .. } => text,
            Self::Completion { reply, .. } => reply,
        }
    }

    /// Whether this turn completed a record
    #[must_use]
    pub const fn is_completion(&self) -> bool {
        matches!(self, Self::Completion { .. })
    }
}

/// Capability interface for strict one-utterance-in, one-reply-out turn
/// handling. Implemented by the engine and composed into transport glue.
pub trait TurnHandler: Send {
    /// Spoken once at session start, before any utterance is received
    fn opening(&self) -> String;

    /// Consume one utterance, return the next prompt or a completion
    fn apply(&mut self, utterance: &str) -> Result<Turn>;

    /// The current question again, for no-op turns
    fn reprompt(&self) -> String;
}

/// The slot-filling state machine for one session
pub struct SlotFillingEngine {
    script: Arc<IntakeScript>,
    store: IntakeStore,
    record: Record,
    cursor: usize,
    previous_summary: Option<String>,
}

impl SlotFillingEngine {
    /// Create an engine awaiting the script's first field.
    ///
    /// Reads the log once, here, when the script asks for greeting recall;
    /// the store is never read again afterwards.
    ///
    /// # Errors
    ///
    /// Returns error if the script is invalid
    pub fn new(script: Arc<IntakeScript>, store: IntakeStore) -> Result<Self> {
        script.validate()?;

        let previous_summary = if script.recall_last {
            store.last_summary()
        } else {
            None
        };

        let record = Record::new(Arc::clone(&script));

        Ok(Self {
            script,
            store,
            record,
            cursor: 0,
            previous_summary,
        })
    }

    /// The script driving this engine
    #[must_use]
    pub fn script(&self) -> &IntakeScript {
        &self.script
    }

    /// The field currently being asked about
    #[must_use]
    pub fn cursor(&self) -> &FieldSpec {
        &self.script.fields[self.cursor]
    }

    /// The in-progress record
    #[must_use]
    pub const fn record(&self) -> &Record {
        &self.record
    }

    /// Persist the finished record, then reset for the next session. The
    /// reset happens regardless of the append outcome; a storage failure is
    /// surfaced only after the engine has cycled.
    fn complete(&mut self) -> Result<Turn> {
        let summary = self.record.summary();
        let entry = self.record.to_json();
        let reply = self.script.farewell.as_ref().map_or_else(
            || summary.clone(),
            |farewell| format!("{summary}. {farewell}"),
        );

        let persisted = self.store.append(&entry);

        tracing::info!(script = %self.script.id, %summary, "record complete");

        self.previous_summary = Some(summary.clone());
        self.record = Record::new(Arc::clone(&self.script));
        self.cursor = 0;

        persisted?;

        Ok(Turn::Completion {
            summary,
            reply,
            record: entry,
        })
    }
}

impl TurnHandler for SlotFillingEngine {
    fn opening(&self) -> String {
        let mut opening = self.script.greeting.clone();
        if let Some(previous) = &self.previous_summary {
            opening.push_str(" Last time you mentioned: ");
            opening.push_str(previous);
            opening.push('.');
        }
        opening.push(' ');
        opening.push_str(&self.script.fields[0].prompt);
        opening
    }

    fn apply(&mut self, utterance: &str) -> Result<Turn> {
        let text = utterance.trim();
        if text.is_empty() {
            return Err(Error::InvalidInput(
                "utterance contains no text".to_string(),
            ));
        }

        let field = &self.script.fields[self.cursor];
        let wrote = if field.kind == FieldKind::List && self.script.is_skip_word(text) {
            tracing::debug!(field = %field.name, "list field closed");
            self.record.close_list(self.cursor);
            false
        } else {
            tracing::debug!(field = %field.name, value = %text, "field written");
            self.record.write(self.cursor, text);
            true
        };

        match self.script.first_missing(&self.record) {
            Some((idx, next)) => {
                self.cursor = idx;
                let turn = Turn::Prompt {
                    field: next.name.clone(),
                    text: next.prompt.clone(),
                };
                // Stepwise durability: the cursor above has already moved,
                // so a failed append leaves the conversation consistent.
                if wrote && self.script.persist == PersistPolicy::EveryStep {
                    self.store.append(&self.record.to_json())?;
                }
                Ok(turn)
            }
            None => self.complete(),
        }
    }

    fn reprompt(&self) -> String {
        self.script.fields[self.cursor].prompt.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValue;

    const COFFEE_SCRIPT: &str = r#"{
        "id": "coffee",
        "title": "Coffee order",
        "greeting": "Welcome!",
        "farewell": "Thanks for visiting!",
        "skip_words": ["no", "none"],
        "fields": [
            {"name": "drinkType", "label": "Drink", "kind": "scalar", "prompt": "What drink?"},
            {"name": "size", "label": "Size", "kind": "scalar", "prompt": "What size?"},
            {"name": "milk", "label": "Milk", "kind": "scalar", "prompt": "What milk?"},
            {"name": "extras", "label": "Extras", "kind": "list", "prompt": "Any extras?"},
            {"name": "name", "label": "Name", "kind": "scalar", "prompt": "Your name?"}
        ]
    }"#;

    fn coffee_engine(dir: &tempfile::TempDir) -> SlotFillingEngine {
        let script = Arc::new(IntakeScript::from_json(COFFEE_SCRIPT).unwrap());
        let store = IntakeStore::new(dir.path().join("coffee_log.json"));
        SlotFillingEngine::new(script, store).unwrap()
    }

    #[test]
    fn test_coffee_order_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = coffee_engine(&dir);

        assert_eq!(engine.opening(), "Welcome! What drink?");

        // each scalar answer advances to the next prompt
        for (utterance, expected_next) in [
            ("latte", "size"),
            ("medium", "milk"),
            ("oat", "extras"),
        ] {
            let turn = engine.apply(utterance).unwrap();
            assert_eq!(
                turn,
                Turn::Prompt {
                    field: expected_next.to_string(),
                    text: engine.cursor().prompt.clone(),
                }
            );
        }

        // a list field keeps the cursor until its skip word
        let turn = engine.apply("whipped cream").unwrap();
        assert!(matches!(turn, Turn::Prompt { ref field, .. } if field == "extras"));
        let turn = engine.apply("no").unwrap();
        assert!(matches!(turn, Turn::Prompt { ref field, .. } if field == "name"));

        let turn = engine.apply("Sam").unwrap();
        let Turn::Completion {
            summary,
            reply,
            record,
        } = turn
        else {
            panic!("expected completion");
        };

        assert_eq!(
            summary,
            "Drink: latte, Size: medium, Milk: oat, Extras: whipped cream, Name: Sam"
        );
        assert!(reply.ends_with("Thanks for visiting!"));
        assert_eq!(record["drinkType"], "latte");
        assert_eq!(record["size"], "medium");
        assert_eq!(record["milk"], "oat");
        assert_eq!(record["extras"], serde_json::json!(["whipped cream"]));
        assert_eq!(record["name"], "Sam");

        // persisted exactly once
        let entries = engine.store.load();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0], record);

        // idempotent reset: cursor back on the first field, record empty
        assert_eq!(engine.cursor().name, "drinkType");
        assert!(!engine.record().is_complete());
        assert_eq!(
            engine.record().value("extras"),
            Some(&FieldValue::List {
                items: vec![],
                closed: false
            })
        );
    }

    #[test]
    fn test_skip_word_leaves_list_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = coffee_engine(&dir);

        for utterance in ["latte", "small", "soy"] {
            engine.apply(utterance).unwrap();
        }

        let turn = engine.apply("none").unwrap();
        assert!(matches!(turn, Turn::Prompt { ref field, .. } if field == "name"));

        let turn = engine.apply("Ana").unwrap();
        let Turn::Completion { record, summary, .. } = turn else {
            panic!("expected completion");
        };
        assert_eq!(record["extras"], serde_json::json!([]));
        assert!(summary.contains("Extras: None"));
    }

    #[test]
    fn test_whitespace_utterance_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = coffee_engine(&dir);

        let err = engine.apply("   ").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        // no-op turn: cursor and record untouched
        assert_eq!(engine.cursor().name, "drinkType");
        assert_eq!(engine.reprompt(), "What drink?");
        assert_eq!(
            engine.record().value("drinkType"),
            Some(&FieldValue::Scalar(None))
        );
    }

    #[test]
    fn test_skip_word_at_scalar_is_a_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = coffee_engine(&dir);

        // "no" is only a skip word for list fields
        engine.apply("no").unwrap();
        assert_eq!(
            engine.record().value("drinkType"),
            Some(&FieldValue::Scalar(Some("no".to_string())))
        );
    }

    #[test]
    fn test_every_step_appends_per_accepted_write() {
        let dir = tempfile::tempdir().unwrap();
        let script = Arc::new(
            IntakeScript::from_json(
                r#"{
                    "id": "check",
                    "title": "Check-in",
                    "greeting": "Hello.",
                    "persist": "every_step",
                    "fields": [
                        {"name": "mood", "label": "Mood", "kind": "scalar", "prompt": "Mood?"},
                        {"name": "energy", "label": "Energy", "kind": "scalar", "prompt": "Energy?"},
                        {"name": "stress", "label": "Stress", "kind": "scalar", "prompt": "Stress?"}
                    ]
                }"#,
            )
            .unwrap(),
        );
        let store = IntakeStore::new(dir.path().join("check_log.json"));
        let mut engine = SlotFillingEngine::new(script, store.clone()).unwrap();

        engine.apply("good").unwrap();
        assert_eq!(store.load().len(), 1);

        engine.apply("high").unwrap();
        assert_eq!(store.load().len(), 2);

        // the final write is covered by the completion append alone
        let turn = engine.apply("low").unwrap();
        assert!(turn.is_completion());
        let entries = store.load();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2]["stress"], "low");
        assert_eq!(entries[2]["summary"], "Mood: good, Energy: high, Stress: low");
    }

    #[test]
    fn test_storage_failure_still_advances() {
        let dir = tempfile::tempdir().unwrap();
        let script = Arc::new(IntakeScript::from_json(COFFEE_SCRIPT).unwrap());
        // a directory as the log path makes every write fail
        let store = IntakeStore::new(dir.path());
        let mut engine = SlotFillingEngine::new(script, store).unwrap();

        for utterance in ["latte", "small", "soy", "no"] {
            engine.apply(utterance).unwrap();
        }

        let err = engine.apply("Ana").unwrap_err();
        assert!(matches!(err, Error::Storage(_)));

        // the engine cycled anyway
        assert_eq!(engine.cursor().name, "drinkType");
        assert!(!engine.record().is_complete());
    }

    #[test]
    fn test_recall_last_summary_in_opening() {
        let dir = tempfile::tempdir().unwrap();
        let script = Arc::new(
            IntakeScript::from_json(
                r#"{
                    "id": "check",
                    "title": "Check-in",
                    "greeting": "Hello again.",
                    "recall_last": true,
                    "fields": [
                        {"name": "mood", "label": "Mood", "kind": "scalar", "prompt": "Mood?"}
                    ]
                }"#,
            )
            .unwrap(),
        );
        let store = IntakeStore::new(dir.path().join("check_log.json"));
        store
            .append(&serde_json::json!({"mood": "great", "summary": "Mood: great"}))
            .unwrap();

        let engine = SlotFillingEngine::new(script, store).unwrap();
        assert_eq!(
            engine.opening(),
            "Hello again. Last time you mentioned: Mood: great. Mood?"
        );
    }
}
