//! Cookie Voice - voice commands for an agent analytics dashboard
//!
//! Listens for spoken commands prefixed with a wake word, works out which
//! agent the user is looking at from the open browser tabs, and drives the
//! dashboard, its backend and a token swap service on the user's behalf.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │   Microphone → Whisper → wake word → Dispatcher     │
//! └────────────────────┬────────────────────────────────┘
//!                      │ transcript
//! ┌────────────────────▼────────────────────────────────┐
//! │   command::parse_all → Intent(s)                    │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │   IntentExecutor                                    │
//! │   links (tabs) │ browser (CDP) │ backend │ swap     │
//! │   advisor (buy/no-buy)         │ speaker            │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod advisor;
pub mod browser;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod integrations;
pub mod links;
pub mod voice;

pub use config::Config;
pub use dispatcher::{Dispatcher, Session};
pub use error::{Error, ListenError, Result};
