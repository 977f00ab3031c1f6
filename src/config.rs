//! Configuration management for the intake gateway

use std::path::{Path, PathBuf};

use crate::schema::IntakeScript;
use crate::{Error, Result};

/// Intake gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Active intake script
    pub script: IntakeScript,

    /// Path to data directory (record logs, config file)
    pub data_dir: PathBuf,

    /// Path of the active script's record log
    pub log_path: PathBuf,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Voice pipeline configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable the speech pipeline
    pub enabled: bool,

    /// STT provider ("deepgram" or "whisper")
    pub stt_provider: String,

    /// STT model (e.g. "nova-3", "whisper-1")
    pub stt_model: String,

    /// TTS provider ("murf" or "openai")
    pub tts_provider: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speaking style (Murf only)
    pub tts_style: String,

    /// TTS speed multiplier (OpenAI only)
    pub tts_speed: f64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stt_provider: "deepgram".to_string(),
            stt_model: "nova-3".to_string(),
            tts_provider: "murf".to_string(),
            tts_voice: "en-US-matthew".to_string(),
            tts_style: "Conversation".to_string(),
            tts_speed: 1.0,
        }
    }
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// Deepgram API key (STT)
    pub deepgram: Option<String>,

    /// `OpenAI` API key (Whisper STT and TTS)
    pub openai: Option<String>,

    /// Murf API key (TTS)
    pub murf: Option<String>,
}

/// Optional `config.toml` in the data directory
#[derive(Debug, Default, serde::Deserialize)]
struct FileConfig {
    #[serde(default)]
    voice: VoiceOverrides,
    log_path: Option<PathBuf>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct VoiceOverrides {
    stt_provider: Option<String>,
    stt_model: Option<String>,
    tts_provider: Option<String>,
    tts_voice: Option<String>,
    tts_style: Option<String>,
    tts_speed: Option<f64>,
}

/// Return the data directory, creating it if needed
///
/// Uses `~/.local/share/intake/` on Linux
pub fn data_dir() -> PathBuf {
    let dir = directories::ProjectDirs::from("dev", "intake", "intake")
        .map_or_else(|| PathBuf::from(".intake"), |d| d.data_dir().to_path_buf());

    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(
            path = %dir.display(),
            error = %e,
            "failed to create data directory"
        );
    }

    dir
}

impl Config {
    /// Load configuration for a script
    ///
    /// # Errors
    ///
    /// Returns error if the script cannot be loaded
    pub fn load(script_id: &str) -> Result<Self> {
        Self::load_with_options(script_id, false)
    }

    /// Load configuration with explicit voice disable option
    ///
    /// # Errors
    ///
    /// Returns error if the script cannot be loaded
    pub fn load_with_options(script_id: &str, disable_voice: bool) -> Result<Self> {
        // Load script with priority: env override → embedded
        let script = Self::load_script_with_priority(script_id)?;
        let data_dir = data_dir();
        let file = Self::load_file_config(&data_dir);

        // API keys from environment
        let api_keys = ApiKeys {
            deepgram: std::env::var("DEEPGRAM_API_KEY").ok(),
            openai: std::env::var("OPENAI_API_KEY").ok(),
            murf: std::env::var("MURF_API_KEY").ok(),
        };

        // Voice settings: defaults, then config file, then env
        let mut voice = VoiceConfig::default();
        let overrides = file.voice;
        if let Some(v) = overrides.stt_provider {
            voice.stt_provider = v;
        }
        if let Some(v) = overrides.stt_model {
            voice.stt_model = v;
        }
        if let Some(v) = overrides.tts_provider {
            voice.tts_provider = v;
        }
        if let Some(v) = overrides.tts_voice {
            voice.tts_voice = v;
        }
        if let Some(v) = overrides.tts_style {
            voice.tts_style = v;
        }
        if let Some(v) = overrides.tts_speed {
            voice.tts_speed = v;
        }
        if let Ok(v) = std::env::var("INTAKE_STT_MODEL") {
            voice.stt_model = v;
        }
        if let Ok(v) = std::env::var("INTAKE_TTS_VOICE") {
            voice.tts_voice = v;
        }
        voice.enabled = !disable_voice;

        if disable_voice {
            tracing::info!("voice explicitly disabled via --disable-voice");
        }

        // Record log path: env override → config file → data dir default
        let log_path = std::env::var("INTAKE_LOG_PATH").map_or_else(
            |_| {
                file.log_path
                    .unwrap_or_else(|| data_dir.join(script.log_file_name()))
            },
            PathBuf::from,
        );

        Ok(Self {
            script,
            data_dir,
            log_path,
            voice,
            api_keys,
        })
    }

    /// Embedded default scripts compiled into the binary
    const EMBEDDED_SCRIPTS: &[(&str, &str)] = &[
        ("coffee", include_str!("../scripts/coffee.json")),
        ("wellness", include_str!("../scripts/wellness.json")),
    ];

    /// Load an embedded script
    ///
    /// # Errors
    ///
    /// Returns error if the script ID is not found in embedded data
    pub fn load_embedded_script(script_id: &str) -> Result<IntakeScript> {
        Self::EMBEDDED_SCRIPTS
            .iter()
            .find(|(id, _)| *id == script_id)
            .map(|(_, json)| {
                let script = IntakeScript::from_json(json)?;
                tracing::debug!(script_id, "loaded embedded script");
                Ok(script)
            })
            .ok_or_else(|| Error::ScriptNotFound(script_id.to_string()))?
    }

    /// Return the embedded script array for enumeration
    #[must_use]
    pub const fn embedded_scripts() -> &'static [(&'static str, &'static str)] {
        Self::EMBEDDED_SCRIPTS
    }

    /// Load a script with priority: `INTAKE_SCRIPTS_DIR` override, embedded
    fn load_script_with_priority(script_id: &str) -> Result<IntakeScript> {
        if let Ok(dir) = std::env::var("INTAKE_SCRIPTS_DIR") {
            let path = PathBuf::from(&dir);
            if path.exists() {
                match Self::load_script_file(&path, script_id) {
                    Ok(script) => {
                        tracing::info!(
                            script_id,
                            path = %path.display(),
                            "loaded script from INTAKE_SCRIPTS_DIR"
                        );
                        return Ok(script);
                    }
                    Err(e) => {
                        tracing::warn!(
                            script_id,
                            error = %e,
                            "INTAKE_SCRIPTS_DIR set but script not found, trying embedded"
                        );
                    }
                }
            } else {
                tracing::warn!(
                    path = %dir,
                    "INTAKE_SCRIPTS_DIR set but directory does not exist"
                );
            }
        }

        Self::load_embedded_script(script_id)
    }

    /// Load a script from `<dir>/<id>.json`
    fn load_script_file(scripts_dir: &Path, script_id: &str) -> Result<IntakeScript> {
        let path = scripts_dir.join(format!("{script_id}.json"));
        if !path.exists() {
            return Err(Error::ScriptNotFound(script_id.to_string()));
        }

        let content = std::fs::read_to_string(&path)?;
        IntakeScript::from_json(&content)
            .map_err(|e| Error::Config(format!("failed to parse {script_id}.json: {e}")))
    }

    /// Load the optional config file, falling back to defaults
    fn load_file_config(data_dir: &Path) -> FileConfig {
        let path = data_dir.join("config.toml");
        if !path.exists() {
            return FileConfig::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "loaded config file");
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to parse config file, using defaults"
                    );
                    FileConfig::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to read config file"
                );
                FileConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldKind, PersistPolicy};

    #[test]
    fn test_embedded_scripts_are_valid() {
        for (id, _) in Config::embedded_scripts() {
            let script = Config::load_embedded_script(id).unwrap();
            assert_eq!(&script.id, id);
            script.validate().unwrap();
        }
    }

    #[test]
    fn test_coffee_script_shape() {
        let script = Config::load_embedded_script("coffee").unwrap();
        let names: Vec<_> = script.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["drinkType", "size", "milk", "extras", "name"]);
        assert_eq!(script.fields[3].kind, FieldKind::List);
        assert_eq!(script.persist, PersistPolicy::OnCompletion);
        assert!(!script.recall_last);
    }

    #[test]
    fn test_wellness_script_shape() {
        let script = Config::load_embedded_script("wellness").unwrap();
        let names: Vec<_> = script.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["mood", "energy", "stress", "objectives"]);
        assert_eq!(script.persist, PersistPolicy::EveryStep);
        assert!(script.recall_last);
    }

    #[test]
    fn test_unknown_script_is_not_found() {
        let err = Config::load_embedded_script("nope").unwrap_err();
        assert!(matches!(err, Error::ScriptNotFound(_)));
    }
}
