//! Voice provider clients
//!
//! REST clients for the speech pipeline's outer ends. The gateway is
//! headless: audio reaches it as bytes, never as hardware streams.

mod stt;
mod tts;

pub use stt::SpeechToText;
pub use tts::TextToSpeech;
