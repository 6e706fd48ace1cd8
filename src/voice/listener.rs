//! Transcript source for the dispatcher

use std::time::Duration;

use async_trait::async_trait;

use super::{AudioCapture, SAMPLE_RATE, Segment, SpeechToText, UtteranceSegmenter, samples_to_wav};
use crate::ListenError;
use crate::config::VoiceConfig;

/// How often captured audio is drained into the segmenter
const CHUNK_INTERVAL: Duration = Duration::from_millis(100);

/// Produces one transcript per call
///
/// Not `Send`: audio streams are bound to the thread that opened them.
#[async_trait(?Send)]
pub trait Listener {
    /// Wait for one utterance and transcribe it
    async fn listen(&mut self) -> Result<String, ListenError>;
}

/// Listens on a microphone and transcribes with Whisper
pub struct MicrophoneListener {
    capture: AudioCapture,
    segmenter: UtteranceSegmenter,
    stt: SpeechToText,
    /// Wall-clock bound on one `listen` call
    deadline: Duration,
}

impl MicrophoneListener {
    /// Create a listener from voice settings
    ///
    /// # Errors
    ///
    /// Returns error if the input device cannot be opened
    pub fn new(config: &VoiceConfig, stt: SpeechToText) -> crate::Result<Self> {
        let capture = AudioCapture::new(config.device_index)?;
        let segmenter = UtteranceSegmenter::new(
            config.energy_threshold,
            config.pause,
            config.phrase_limit,
            config.listen_timeout,
        );

        Ok(Self {
            capture,
            segmenter,
            stt,
            deadline: config.listen_timeout + config.phrase_limit + Duration::from_secs(1),
        })
    }

    async fn record_utterance(&mut self) -> Result<Vec<f32>, ListenError> {
        self.segmenter.reset();
        self.capture.clear_buffer();
        self.capture
            .start()
            .map_err(|e| ListenError::ServiceUnavailable(e.to_string()))?;

        tracing::debug!("listening");
        let started = tokio::time::Instant::now();

        let outcome = loop {
            tokio::time::sleep(CHUNK_INTERVAL).await;

            let chunk = self.capture.take_buffer();
            match self.segmenter.push(&chunk) {
                Segment::Complete(samples) => break Ok(samples),
                Segment::TimedOut => break Err(ListenError::NoSpeech),
                Segment::Pending if started.elapsed() > self.deadline => {
                    break Err(ListenError::NoSpeech);
                }
                Segment::Pending => {}
            }
        };

        self.capture.stop();
        outcome
    }
}

#[async_trait(?Send)]
impl Listener for MicrophoneListener {
    async fn listen(&mut self) -> Result<String, ListenError> {
        let samples = self.record_utterance().await?;
        tracing::debug!(samples = samples.len(), "got utterance, recognizing");

        let wav = samples_to_wav(&samples, SAMPLE_RATE)
            .map_err(|e| ListenError::ServiceUnavailable(e.to_string()))?;
        let transcript = self
            .stt
            .transcribe(&wav)
            .await
            .map_err(|e| ListenError::ServiceUnavailable(e.to_string()))?;

        if transcript.is_empty() {
            return Err(ListenError::Unintelligible);
        }

        tracing::info!(transcript, "heard");
        Ok(transcript)
    }
}
