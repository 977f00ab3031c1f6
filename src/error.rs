//! Error types for the intake gateway

use thiserror::Error;

/// Result type alias for intake operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the intake gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Intake script not found
    #[error("script not found: {0}")]
    ScriptNotFound(String),

    /// An utterance the engine cannot accept (whitespace-only input).
    /// Callers treat this as a no-op turn and re-prompt.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Persistence write failure. The in-memory engine state has already
    /// advanced when this is returned; durability is best-effort.
    #[error("storage error: {0}")]
    Storage(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Transport error (console or HTTP turn delivery)
    #[error("transport error: {0}")]
    Transport(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
