//! Error types for the voice dispatcher

use thiserror::Error;

/// Result type alias for dispatcher operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while interpreting and executing voice commands
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Required browser context (profile or contract tab) was not found
    ///
    /// The message is the corrective prompt spoken back to the user
    #[error("resolution failure: {0}")]
    Resolution(String),

    /// Backend or swap service is unreachable
    #[error("connectivity failure: {0}")]
    Connectivity(String),

    /// Expected UI element never appeared or an action on it failed
    #[error("ui failure: {0}")]
    Ui(String),

    /// Browser transport error
    #[error("browser error: {0}")]
    Browser(String),

    /// A parameter the intent needs was missing from the transcript
    ///
    /// The message is the prompt asking the user to repeat with the parameter
    #[error("missing parameter: {0}")]
    MissingParameter(String),

    /// Backend API returned an error response
    #[error("backend error: {0}")]
    Backend(String),

    /// Swap service rejected the swap
    #[error("swap failed: {0}")]
    Swap(String),

    /// Speech recognition error
    #[error("recognition failure: {0}")]
    Recognition(#[from] ListenError),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text API error
    #[error("STT error: {0}")]
    Stt(String),

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

    /// URL parsing error
    #[error("url error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// The single user-facing sentence spoken when an intent fails with this error
    #[must_use]
    pub fn spoken_message(&self) -> String {
        match self {
            Self::Resolution(prompt) | Self::MissingParameter(prompt) => prompt.clone(),
            Self::Connectivity(_) => {
                "Sorry, I cannot connect to the API server. Please make sure it's running."
                    .to_string()
            }
            Self::Swap(reason) => format!("Swap failed: {reason}"),
            Self::Http(e) if e.is_connect() || e.is_timeout() => {
                "Sorry, I cannot connect to the API server. Please make sure it's running."
                    .to_string()
            }
            _ => "Sorry, something went wrong while doing that. Please try again.".to_string(),
        }
    }
}

/// Failure to obtain a transcript from the speech collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenError {
    /// Nothing above the energy threshold was heard before the wait timeout
    #[error("no speech detected within timeout")]
    NoSpeech,

    /// Audio was captured but could not be turned into text
    #[error("could not understand audio")]
    Unintelligible,

    /// The transcription service could not be reached or rejected the request
    #[error("speech service unavailable: {0}")]
    ServiceUnavailable(String),
}
