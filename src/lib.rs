//! Intake Gateway - voice-driven collector for scripted orders and check-ins
//!
//! This library provides the core functionality for the intake gateway:
//! - Slot-filling dialogue engine driven by intake scripts
//! - Append-only JSON record log
//! - STT/TTS provider clients (Deepgram, Whisper, Murf, OpenAI)
//! - Transports (console, HTTP API)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Transports                        │
//! │      Console  │  HTTP text  │  HTTP audio           │
//! └────────────────────┬────────────────────────────────┘
//!                      │ utterance in / reply out
//! ┌────────────────────▼────────────────────────────────┐
//! │              SlotFillingEngine                       │
//! │   IntakeScript  │  Record  │  cursor                │
//! └────────────────────┬────────────────────────────────┘
//!                      │ completed records
//! ┌────────────────────▼────────────────────────────────┐
//! │                 IntakeStore                          │
//! │          JSON array log on disk                      │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod daemon;
pub mod engine;
pub mod error;
pub mod record;
pub mod schema;
pub mod session;
pub mod store;
pub mod voice;

pub use config::{ApiKeys, Config, VoiceConfig};
pub use daemon::Daemon;
pub use engine::{SlotFillingEngine, Turn, TurnHandler};
pub use error::{Error, Result};
pub use record::{FieldValue, Record};
pub use schema::{FieldKind, FieldSpec, IntakeScript, PersistPolicy};
pub use session::{ConsoleTransport, DialogueSession, Transport};
pub use store::IntakeStore;
pub use voice::{SpeechToText, TextToSpeech};
