//! Shared test utilities

use std::sync::Arc;

use intake_gateway::{Config, IntakeStore, SlotFillingEngine};

/// Store backed by a file inside a temp directory
#[must_use]
pub fn temp_store(dir: &tempfile::TempDir, file_name: &str) -> IntakeStore {
    IntakeStore::new(dir.path().join(file_name))
}

/// Engine running one of the embedded scripts against the given store
#[must_use]
pub fn embedded_engine(script_id: &str, store: IntakeStore) -> SlotFillingEngine {
    let script = Config::load_embedded_script(script_id).expect("embedded script loads");
    SlotFillingEngine::new(Arc::new(script), store).expect("engine builds")
}
