//! Speech-to-text providers

use crate::config::{ApiKeys, VoiceConfig};
use crate::{Error, Result};

/// STT provider backend with its credentials
enum SttBackend {
    Deepgram { api_key: String, model: String },
    Whisper { api_key: String, model: String },
}

/// Transcribes WAV audio to text
pub struct SpeechToText {
    client: reqwest::Client,
    backend: SttBackend,
}

impl SpeechToText {
    /// Build the configured STT backend
    ///
    /// # Errors
    ///
    /// Returns error if the provider is unknown or its API key is missing
    pub fn from_config(voice: &VoiceConfig, keys: &ApiKeys) -> Result<Self> {
        let backend = match voice.stt_provider.as_str() {
            "deepgram" => SttBackend::Deepgram {
                api_key: keys.deepgram.clone().ok_or_else(|| {
                    Error::Config("DEEPGRAM_API_KEY required for Deepgram STT".to_string())
                })?,
                model: voice.stt_model.clone(),
            },
            "whisper" => SttBackend::Whisper {
                api_key: keys.openai.clone().ok_or_else(|| {
                    Error::Config("OPENAI_API_KEY required for Whisper STT".to_string())
                })?,
                model: voice.stt_model.clone(),
            },
            other => {
                return Err(Error::Config(format!("unknown STT provider '{other}'")));
            }
        };

        Ok(Self {
            client: reqwest::Client::new(),
            backend,
        })
    }

    /// Transcribe audio to text
    ///
    /// # Arguments
    ///
    /// * `audio` - WAV audio bytes
    ///
    /// # Errors
    ///
    /// Returns error if transcription fails
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        match &self.backend {
            SttBackend::Deepgram { api_key, model } => {
                self.transcribe_deepgram(audio, api_key, model).await
            }
            SttBackend::Whisper { api_key, model } => {
                self.transcribe_whisper(audio, api_key, model).await
            }
        }
    }

    async fn transcribe_deepgram(
        &self,
        audio: &[u8],
        api_key: &str,
        model: &str,
    ) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), model, "Deepgram transcription");

        let url = format!("https://api.deepgram.com/v1/listen?model={model}&punctuate=true");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {api_key}"))
            .header("Content-Type", "audio/wav")
            .body(audio.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Deepgram API error");
            return Err(Error::Stt(format!("Deepgram API error {status}: {body}")));
        }

        let payload: serde_json::Value = response.json().await?;
        let transcript = payload
            .pointer("/results/channels/0/alternatives/0/transcript")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();

        tracing::info!(transcript = %transcript, "transcription complete");
        Ok(transcript)
    }

    async fn transcribe_whisper(
        &self,
        audio: &[u8],
        api_key: &str,
        model: &str,
    ) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), model, "Whisper transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", model.to_string());

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {api_key}"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        #[derive(serde::Deserialize)]
        struct WhisperResponse {
            text: String,
        }

        let result: WhisperResponse = response.json().await?;
        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }
}
