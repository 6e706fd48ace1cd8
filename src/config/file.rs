//! TOML configuration file loading
//!
//! Supports `~/.config/cookie-voice/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Backend, frontend and swap service endpoints
    #[serde(default)]
    pub endpoints: EndpointsFileConfig,

    /// Browser session configuration
    #[serde(default)]
    pub browser: BrowserFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Executor wait and health check timings
    #[serde(default)]
    pub timing: TimingFileConfig,

    /// Where buy recommendations read agent metrics from ("page" or "backend")
    pub metrics_source: Option<String>,
}

/// Service endpoints
#[derive(Debug, Default, Deserialize)]
pub struct EndpointsFileConfig {
    /// Backend REST API base URL
    pub api_url: Option<String>,

    /// Frontend web app base URL
    pub frontend_url: Option<String>,

    /// Swap service base URL
    pub swap_url: Option<String>,

    /// API key forwarded as `x-api-key`
    pub api_key: Option<String>,
}

/// Browser session configuration
#[derive(Debug, Default, Deserialize)]
pub struct BrowserFileConfig {
    /// Chrome remote debugging address (e.g. "127.0.0.1:9222")
    pub debugger_address: Option<String>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Wake word that gates command dispatch
    pub wake_word: Option<String>,

    /// `OpenAI` API key for Whisper transcription
    pub openai_api_key: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// Input device index (defaults to the system default input)
    pub device_index: Option<usize>,

    /// RMS energy above which audio counts as speech
    pub energy_threshold: Option<f32>,

    /// Seconds of silence that end an utterance
    pub pause_secs: Option<f32>,

    /// Maximum utterance length in seconds
    pub phrase_limit_secs: Option<f32>,

    /// Seconds to wait for speech to start
    pub listen_timeout_secs: Option<f32>,

    /// Command used to speak responses aloud
    pub speech_command: Option<String>,
}

/// Executor timings, all in seconds
#[derive(Debug, Default, Deserialize)]
pub struct TimingFileConfig {
    pub health_timeout_secs: Option<f32>,
    pub settle_secs: Option<f32>,
    pub element_timeout_secs: Option<f32>,
    pub request_timeout_secs: Option<f32>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ConfigFile {
    config_file_path().map_or_else(ConfigFile::default, |path| load_config_file_from(&path))
}

/// Load a TOML config file from an explicit path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file_from(path: &Path) -> ConfigFile {
    if !path.exists() {
        return ConfigFile::default();
    }

    match std::fs::read_to_string(path) {
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
                ConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/cookie-voice/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("cookie-voice").join("config.toml"))
}
