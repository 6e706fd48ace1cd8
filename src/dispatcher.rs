//! Session and listen loop
//!
//! The session owns every collaborator for the life of the process. The
//! dispatcher feeds it one transcript at a time: a transcript is gated on the
//! wake word, classified, and each resulting intent runs to completion before
//! the next transcript is captured.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::advisor::{BackendMetrics, MetricsProvider, PageMetrics};
use crate::browser::{BrowserContext, CdpBrowser};
use crate::command::{self, Intent};
use crate::config::{Config, MetricsSource};
use crate::executor::IntentExecutor;
use crate::integrations::{BackendClient, SwapClient};
use crate::voice::{Listener, Reminders, Speaker, WakeWord};
use crate::{ListenError, Result};

/// Pause after the speech service fails before listening again
const SERVICE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Long-lived collaborators shared by every intent
pub struct Session {
    pub config: Config,
    pub browser: Arc<dyn BrowserContext>,
    pub backend: BackendClient,
    pub swap: SwapClient,
    pub speaker: Arc<dyn Speaker>,
    pub metrics: Box<dyn MetricsProvider>,
}

impl Session {
    /// Build a session around an existing browser connection
    #[must_use]
    pub fn new(config: Config, browser: Arc<dyn BrowserContext>, speaker: Arc<dyn Speaker>) -> Self {
        let backend = BackendClient::new(
            config.endpoints.api_url.clone(),
            config.endpoints.api_key.clone(),
        )
        .with_request_timeout(config.timing.request_timeout);
        let swap = SwapClient::new(config.endpoints.swap_url.clone());

        let metrics: Box<dyn MetricsProvider> = match config.metrics_source {
            MetricsSource::Page => Box::new(PageMetrics::new(config.timing.element_timeout)),
            MetricsSource::Backend => Box::new(BackendMetrics::new(backend.clone())),
        };

        Self {
            config,
            browser,
            backend,
            swap,
            speaker,
            metrics,
        }
    }

    /// Attach to the running browser and build a session
    ///
    /// # Errors
    ///
    /// Returns error if the browser cannot be reached; nothing can run
    /// without it
    pub async fn connect(config: Config, speaker: Arc<dyn Speaker>) -> Result<Self> {
        let browser = CdpBrowser::connect(&config.debugger_address).await?;
        Ok(Self::new(config, Arc::new(browser), speaker))
    }

    /// Executor borrowing this session's collaborators
    #[must_use]
    pub fn executor(&self) -> IntentExecutor<'_> {
        IntentExecutor {
            browser: self.browser.as_ref(),
            backend: &self.backend,
            swap: &self.swap,
            speaker: self.speaker.as_ref(),
            metrics: self.metrics.as_ref(),
            frontend: &self.config.endpoints.frontend_url,
            timing: &self.config.timing,
        }
    }
}

/// Gates transcripts on the wake word and runs their intents in order
pub struct Dispatcher {
    session: Session,
    wake_word: WakeWord,
    reminders: Reminders,
}

impl Dispatcher {
    #[must_use]
    pub fn new(session: Session) -> Self {
        let word = session.config.voice.wake_word.clone();
        Self {
            wake_word: WakeWord::new(&word),
            reminders: Reminders::new(&word),
            session,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Handle one transcript
    ///
    /// Returns the intents that were executed; empty when the wake word was
    /// missing and a reminder was spoken instead.
    pub async fn handle_transcript(&mut self, transcript: &str) -> Vec<Intent> {
        if !self.wake_word.matches(transcript) {
            tracing::debug!(transcript, "no wake word");
            let reminder = self.reminders.next_reminder().to_string();
            self.session.speaker.speak(&reminder).await;
            return Vec::new();
        }

        let intents = command::parse_all_with_wake_word(transcript, self.wake_word.word());
        let executor = self.session.executor();
        for intent in &intents {
            executor.execute(intent).await;
        }
        intents
    }

    /// Listen and dispatch until Ctrl-C
    ///
    /// # Errors
    ///
    /// Currently infallible; listen failures are absorbed
    #[allow(clippy::future_not_send)]
    pub async fn run(&mut self, listener: &mut dyn Listener) -> Result<()> {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx.send(()).await;
            }
        });

        self.run_until(listener, &mut shutdown_rx).await
    }

    /// Listen and dispatch until `shutdown_rx` receives or closes
    ///
    /// # Errors
    ///
    /// Currently infallible; listen failures are absorbed
    #[allow(clippy::future_not_send)]
    pub async fn run_until(
        &mut self,
        listener: &mut dyn Listener,
        shutdown_rx: &mut mpsc::Receiver<()>,
    ) -> Result<()> {
        let word = self.wake_word.word().to_string();
        self.session
            .speaker
            .speak(&format!(
                "Voice assistant is ready. Say '{word} check this agent' when on a Twitter profile."
            ))
            .await;

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("shutdown requested");
                    break;
                }
                heard = listener.listen() => match heard {
                    Ok(transcript) => {
                        self.handle_transcript(&transcript).await;
                    }
                    Err(ListenError::ServiceUnavailable(reason)) => {
                        tracing::warn!(reason, "speech service unavailable");
                        tokio::time::sleep(SERVICE_RETRY_DELAY).await;
                    }
                    Err(e) => tracing::debug!(error = %e, "nothing heard"),
                },
            }
        }

        Ok(())
    }
}
