//! Daemon - the gateway service
//!
//! Wires the configured script, record log, and voice providers into the
//! HTTP API and serves until interrupted.

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::api::{self, ApiState};
use crate::store::IntakeStore;
use crate::voice::{SpeechToText, TextToSpeech};
use crate::{Config, Error, Result};

/// The intake daemon
pub struct Daemon {
    config: Config,
    port: u16,
}

impl Daemon {
    /// Create a new daemon instance
    #[must_use]
    pub const fn new(config: Config, port: u16) -> Self {
        Self { config, port }
    }

    /// Construct the voice clients, degrading to text-only when keys are
    /// missing
    fn init_voice(&self) -> (Option<Arc<SpeechToText>>, Option<Arc<TextToSpeech>>) {
        if !self.config.voice.enabled {
            tracing::info!("voice disabled, text turns only");
            return (None, None);
        }

        let stt = match SpeechToText::from_config(&self.config.voice, &self.config.api_keys) {
            Ok(stt) => Some(Arc::new(stt)),
            Err(e) => {
                tracing::warn!(error = %e, "STT unavailable");
                None
            }
        };

        let tts = match TextToSpeech::from_config(&self.config.voice, &self.config.api_keys) {
            Ok(tts) => Some(Arc::new(tts)),
            Err(e) => {
                tracing::warn!(error = %e, "TTS unavailable");
                None
            }
        };

        (stt, tts)
    }

    /// Run the daemon until interrupted
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or run
    pub async fn run(self) -> Result<()> {
        tracing::info!(
            port = self.port,
            script = %self.config.script.id,
            log = %self.config.log_path.display(),
            "daemon running"
        );

        let (stt, tts) = self.init_voice();
        let store = IntakeStore::new(self.config.log_path.clone());
        let script = Arc::new(self.config.script.clone());

        let state = Arc::new(ApiState::new(script, store, stt, tts));
        let router = api::router(state);

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("shutting down");
            })
            .await
            .map_err(|e| Error::Transport(format!("API server error: {e}")))?;

        Ok(())
    }
}
