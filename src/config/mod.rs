//! Configuration management for the voice dispatcher
//!
//! Values resolve as environment variable > config file > built-in default.

pub mod file;

use std::time::Duration;

use crate::{Error, Result};

use self::file::ConfigFile;

/// Default backend REST API base URL
pub const DEFAULT_API_URL: &str = "http://localhost:5002/api";

/// Default frontend web app base URL
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5003";

/// Default swap service base URL
pub const DEFAULT_SWAP_URL: &str = "http://localhost:3001";

/// Default Chrome remote debugging address
pub const DEFAULT_DEBUGGER_ADDRESS: &str = "127.0.0.1:9222";

/// Default wake word
pub const DEFAULT_WAKE_WORD: &str = "cookie";

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Service endpoints
    pub endpoints: Endpoints,

    /// Chrome remote debugging address
    pub debugger_address: String,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Executor timings
    pub timing: Timing,

    /// Source of agent metrics for buy recommendations
    pub metrics_source: MetricsSource,
}

/// Base URLs of the collaborating services
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Backend REST API base URL (`API_URL`)
    pub api_url: String,

    /// Frontend web app base URL (`FRONTEND_URL`)
    pub frontend_url: String,

    /// Swap service base URL (`SWAP_API_URL`)
    pub swap_url: String,

    /// API key sent as `x-api-key` (`COOKIE_API_KEY`)
    pub api_key: Option<String>,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            swap_url: DEFAULT_SWAP_URL.to_string(),
            api_key: None,
        }
    }
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Wake word that must appear in a transcript before it is dispatched
    pub wake_word: String,

    /// `OpenAI` API key used for Whisper transcription
    pub openai_api_key: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// Input device index; `None` uses the system default input
    pub device_index: Option<usize>,

    /// RMS energy above which a chunk counts as speech
    pub energy_threshold: f32,

    /// Silence that ends an utterance
    pub pause: Duration,

    /// Longest utterance captured before transcription is forced
    pub phrase_limit: Duration,

    /// How long to wait for speech to start
    pub listen_timeout: Duration,

    /// Command used to speak responses (receives the text as its last argument)
    pub speech_command: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            wake_word: DEFAULT_WAKE_WORD.to_string(),
            openai_api_key: None,
            stt_model: "whisper-1".to_string(),
            device_index: None,
            energy_threshold: 0.03,
            pause: Duration::from_millis(500),
            phrase_limit: Duration::from_secs(5),
            listen_timeout: Duration::from_secs(10),
            speech_command: "say".to_string(),
        }
    }
}

/// Waits and health checks used by the intent executor
#[derive(Debug, Clone)]
pub struct Timing {
    /// Timeout of the backend liveness check issued before navigation
    pub health_timeout: Duration,

    /// Grace period after opening a tab before looking for elements
    pub settle: Duration,

    /// Bound on each single element wait
    pub element_timeout: Duration,

    /// Timeout of regular backend and swap requests
    pub request_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            health_timeout: Duration::from_secs(2),
            settle: Duration::from_secs(3),
            element_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Where buy recommendations read agent metrics from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MetricsSource {
    /// Scrape the rendered agent details page
    #[default]
    Page,
    /// Fetch the agent record from the backend API
    Backend,
}

impl std::str::FromStr for MetricsSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "page" => Ok(Self::Page),
            "backend" => Ok(Self::Backend),
            other => Err(Error::Config(format!(
                "unknown metrics source '{other}' (expected 'page' or 'backend')"
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            debugger_address: DEFAULT_DEBUGGER_ADDRESS.to_string(),
            voice: VoiceConfig::default(),
            timing: Timing::default(),
            metrics_source: MetricsSource::default(),
        }
    }
}

impl Config {
    /// Load configuration from the environment and the optional config file
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but malformed
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed config file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but malformed
    pub fn from_sources(fc: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let endpoints = Endpoints {
            api_url: trim_base(
                env("API_URL")
                    .or(fc.endpoints.api_url)
                    .unwrap_or(defaults.endpoints.api_url),
            ),
            frontend_url: trim_base(
                env("FRONTEND_URL")
                    .or(fc.endpoints.frontend_url)
                    .unwrap_or(defaults.endpoints.frontend_url),
            ),
            swap_url: trim_base(
                env("SWAP_API_URL")
                    .or(fc.endpoints.swap_url)
                    .unwrap_or(defaults.endpoints.swap_url),
            ),
            api_key: env("COOKIE_API_KEY")
                .or(fc.endpoints.api_key)
                .filter(|k| !k.is_empty()),
        };

        for (name, value) in [
            ("API_URL", &endpoints.api_url),
            ("FRONTEND_URL", &endpoints.frontend_url),
            ("SWAP_API_URL", &endpoints.swap_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| Error::Config(format!("{name} is not a valid URL ({value}): {e}")))?;
        }

        let debugger_address = env("COOKIE_DEBUGGER_ADDRESS")
            .or(fc.browser.debugger_address)
            .unwrap_or(defaults.debugger_address);

        let voice = VoiceConfig {
            wake_word: env("COOKIE_WAKE_WORD")
                .or(fc.voice.wake_word)
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .unwrap_or(defaults.voice.wake_word),
            openai_api_key: env("OPENAI_API_KEY").or(fc.voice.openai_api_key),
            stt_model: env("COOKIE_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or(defaults.voice.stt_model),
            device_index: parse_env(&env, "COOKIE_MIC_DEVICE")?.or(fc.voice.device_index),
            energy_threshold: parse_env(&env, "COOKIE_ENERGY_THRESHOLD")?
                .or(fc.voice.energy_threshold)
                .unwrap_or(defaults.voice.energy_threshold),
            pause: secs_or("pause_secs", fc.voice.pause_secs, defaults.voice.pause)?,
            phrase_limit: secs_or(
                "phrase_limit_secs",
                fc.voice.phrase_limit_secs,
                defaults.voice.phrase_limit,
            )?,
            listen_timeout: secs_or(
                "listen_timeout_secs",
                fc.voice.listen_timeout_secs,
                defaults.voice.listen_timeout,
            )?,
            speech_command: env("COOKIE_SPEECH_COMMAND")
                .or(fc.voice.speech_command)
                .unwrap_or(defaults.voice.speech_command),
        };

        let timing = Timing {
            health_timeout: secs_or(
                "health_timeout_secs",
                fc.timing.health_timeout_secs,
                defaults.timing.health_timeout,
            )?,
            settle: secs_or("settle_secs", fc.timing.settle_secs, defaults.timing.settle)?,
            element_timeout: secs_or(
                "element_timeout_secs",
                fc.timing.element_timeout_secs,
                defaults.timing.element_timeout,
            )?,
            request_timeout: secs_or(
                "request_timeout_secs",
                fc.timing.request_timeout_secs,
                defaults.timing.request_timeout,
            )?,
        };

        let metrics_source = env("COOKIE_METRICS_SOURCE")
            .or(fc.metrics_source)
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            endpoints,
            debugger_address,
            voice,
            timing,
            metrics_source,
        })
    }
}

/// Strip trailing slashes so paths can be appended with `format!("{base}/…")`
fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Seconds from the config file, or `default` when unset
fn secs_or(key: &str, secs: Option<f32>, default: Duration) -> Result<Duration> {
    secs.map_or(Ok(default), |s| {
        Duration::try_from_secs_f32(s)
            .map_err(|e| Error::Config(format!("{key} is not a usable duration ({s}): {e}")))
    })
}

fn parse_env<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    env(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| Error::Config(format!("{key} has an invalid value: {raw}")))
        })
        .transpose()
}
