//! HTTP API server for the intake gateway
//!
//! The gateway's transport boundary: utterances arrive as text or WAV audio
//! over HTTP, replies leave as text or MP3 audio.

pub mod health;
pub mod intake;

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::engine::SlotFillingEngine;
use crate::schema::IntakeScript;
use crate::store::IntakeStore;
use crate::voice::{SpeechToText, TextToSpeech};
use crate::Result;

/// Per-session engines, each behind its own lock. Turns within a session
/// are serialized; sessions stay independent.
type SessionMap = HashMap<String, Arc<Mutex<SlotFillingEngine>>>;

/// Shared state for API handlers
pub struct ApiState {
    /// Active intake script
    pub script: Arc<IntakeScript>,

    /// Record log shared by all sessions
    pub store: IntakeStore,

    /// Live sessions keyed by session ID
    pub sessions: Mutex<SessionMap>,

    /// STT client; `None` when voice is disabled or unconfigured
    pub stt: Option<Arc<SpeechToText>>,

    /// TTS client; `None` when voice is disabled or unconfigured
    pub tts: Option<Arc<TextToSpeech>>,
}

impl ApiState {
    /// Create API state for a script and its store
    #[must_use]
    pub fn new(
        script: Arc<IntakeScript>,
        store: IntakeStore,
        stt: Option<Arc<SpeechToText>>,
        tts: Option<Arc<TextToSpeech>>,
    ) -> Self {
        Self {
            script,
            store,
            sessions: Mutex::new(HashMap::new()),
            stt,
            tts,
        }
    }

    /// Fetch a session's engine, creating it on first use
    ///
    /// # Errors
    ///
    /// Returns error if a fresh engine cannot be constructed
    pub async fn session(&self, session_id: &str) -> Result<Arc<Mutex<SlotFillingEngine>>> {
        let mut sessions = self.sessions.lock().await;
        if let Some(engine) = sessions.get(session_id) {
            return Ok(Arc::clone(engine));
        }

        let engine = SlotFillingEngine::new(Arc::clone(&self.script), self.store.clone())?;
        let engine = Arc::new(Mutex::new(engine));
        sessions.insert(session_id.to_string(), Arc::clone(&engine));

        tracing::debug!(session_id, script = %self.script.id, "session created");
        Ok(engine)
    }
}

/// Build the router with all routes
pub fn router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(health::router(Arc::clone(&state)))
        .nest("/api/intake", intake::router(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
