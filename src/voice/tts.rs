//! Text-to-speech providers

use base64::Engine as _;

use crate::config::{ApiKeys, VoiceConfig};
use crate::{Error, Result};

/// TTS provider backend with its credentials
enum TtsBackend {
    Murf {
        api_key: String,
        voice: String,
        style: String,
    },
    OpenAi {
        api_key: String,
        voice: String,
        speed: f64,
    },
}

/// Synthesizes speech (MP3) from text
pub struct TextToSpeech {
    client: reqwest::Client,
    backend: TtsBackend,
}

impl TextToSpeech {
    /// Build the configured TTS backend
    ///
    /// # Errors
    ///
    /// Returns error if the provider is unknown or its API key is missing
    pub fn from_config(voice: &VoiceConfig, keys: &ApiKeys) -> Result<Self> {
        let backend = match voice.tts_provider.as_str() {
            "murf" => TtsBackend::Murf {
                api_key: keys.murf.clone().ok_or_else(|| {
                    Error::Config("MURF_API_KEY required for Murf TTS".to_string())
                })?,
                voice: voice.tts_voice.clone(),
                style: voice.tts_style.clone(),
            },
            "openai" => TtsBackend::OpenAi {
                api_key: keys.openai.clone().ok_or_else(|| {
                    Error::Config("OPENAI_API_KEY required for OpenAI TTS".to_string())
                })?,
                voice: voice.tts_voice.clone(),
                speed: voice.tts_speed,
            },
            other => {
                return Err(Error::Config(format!("unknown TTS provider '{other}'")));
            }
        };

        Ok(Self {
            client: reqwest::Client::new(),
            backend,
        })
    }

    /// Synthesize text to MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        match &self.backend {
            TtsBackend::Murf {
                api_key,
                voice,
                style,
            } => self.synthesize_murf(text, api_key, voice, style).await,
            TtsBackend::OpenAi {
                api_key,
                voice,
                speed,
            } => self.synthesize_openai(text, api_key, voice, *speed).await,
        }
    }

    async fn synthesize_murf(
        &self,
        text: &str,
        api_key: &str,
        voice: &str,
        style: &str,
    ) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        #[serde(rename_all = "camelCase")]
        struct MurfRequest<'a> {
            text: &'a str,
            voice_id: &'a str,
            style: &'a str,
            format: &'a str,
            encode_as_base_64: bool,
        }

        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct MurfResponse {
            encoded_audio: String,
        }

        tracing::debug!(chars = text.len(), voice, "Murf synthesis");

        let request = MurfRequest {
            text,
            voice_id: voice,
            style,
            format: "MP3",
            encode_as_base_64: true,
        };

        let response = self
            .client
            .post("https://api.murf.ai/v1/speech/generate")
            .header("api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Murf API error");
            return Err(Error::Tts(format!("Murf API error {status}: {body}")));
        }

        let result: MurfResponse = response.json().await?;
        let audio = base64::engine::general_purpose::STANDARD
            .decode(result.encoded_audio)
            .map_err(|e| Error::Tts(format!("Murf returned invalid base64: {e}")))?;

        Ok(audio)
    }

    async fn synthesize_openai(
        &self,
        text: &str,
        api_key: &str,
        voice: &str,
        speed: f64,
    ) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f64,
        }

        tracing::debug!(chars = text.len(), voice, "OpenAI synthesis");

        let request = TtsRequest {
            model: "tts-1",
            input: text,
            voice,
            speed,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}
