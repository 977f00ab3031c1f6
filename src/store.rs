//! Record log persistence
//!
//! The log is a UTF-8 JSON array at a fixed path, rewritten in full on each
//! append. One store owns one file; clones serialize through a shared lock,
//! but writers in other processes are not supported.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::{Error, Result};

/// Append-only JSON-array log of intake records
#[derive(Debug, Clone)]
pub struct IntakeStore {
    path: PathBuf,
    /// Serializes the read-modify-write across clones sharing this file
    file_lock: Arc<Mutex<()>>,
}

impl IntakeStore {
    /// Create a store backed by the given file path. The file is not touched
    /// until the first append. Clones share one file lock, so sessions
    /// writing to the same log are serialized.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The backing file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the recorded entries. A missing, unreadable, corrupt, or
    /// non-array file is treated as empty history, logged at warn and never
    /// escalated.
    #[must_use]
    pub fn load(&self) -> Vec<Value> {
        let _guard = self
            .file_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.load_unlocked()
    }

    fn load_unlocked(&self) -> Vec<Value> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to read log, treating as empty"
                );
                return Vec::new();
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "log is not a JSON array, treating as empty"
                );
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "corrupt log, treating as empty"
                );
                Vec::new()
            }
        }
    }

    /// Append an entry: load, push, rewrite the whole array.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` only if the final write cannot be completed
    pub fn append(&self, entry: &Value) -> Result<()> {
        let _guard = self
            .file_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut entries = self.load_unlocked();
        entries.push(entry.clone());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Storage(format!(
                    "failed to create {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let json = serde_json::to_string_pretty(&Value::Array(entries))
            .map_err(|e| Error::Storage(format!("failed to serialize log: {e}")))?;

        std::fs::write(&self.path, json).map_err(|e| {
            Error::Storage(format!("failed to write {}: {e}", self.path.display()))
        })?;

        tracing::debug!(path = %self.path.display(), "log entry written");
        Ok(())
    }

    /// The `summary` of the most recent entry, if any. Used for greeting
    /// continuity when a script sets `recall_last`.
    #[must_use]
    pub fn last_summary(&self) -> Option<String> {
        self.load()
            .last()
            .and_then(|entry| entry.get("summary"))
            .and_then(Value::as_str)
            .map(String::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_store(dir: &tempfile::TempDir) -> IntakeStore {
        IntakeStore::new(dir.path().join("test_log.json"))
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);
        assert!(store.load().is_empty());
        assert!(store.last_summary().is_none());
    }

    #[test]
    fn test_append_accumulates() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);

        store.append(&json!({"summary": "first"})).unwrap();
        store.append(&json!({"summary": "second"})).unwrap();

        let entries = store.load();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["summary"], "first");
        assert_eq!(entries[1]["summary"], "second");
        assert_eq!(store.last_summary().as_deref(), Some("second"));
    }

    #[test]
    fn test_corrupt_file_swallowed_on_append() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);

        std::fs::write(store.path(), "not json at all").unwrap();
        assert!(store.load().is_empty());

        store.append(&json!({"summary": "fresh"})).unwrap();
        let entries = store.load();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["summary"], "fresh");
    }

    #[test]
    fn test_non_array_file_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);

        std::fs::write(store.path(), r#""not an array""#).unwrap();
        assert!(store.load().is_empty());

        store.append(&json!({"n": 1})).unwrap();
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn test_append_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = IntakeStore::new(dir.path().join("nested/dir/log.json"));
        store.append(&json!({"n": 1})).unwrap();
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn test_write_failure_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        // the path is a directory, so the write must fail
        let store = IntakeStore::new(dir.path());
        let err = store.append(&json!({"n": 1})).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
