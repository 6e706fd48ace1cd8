//! Energy-based utterance segmentation
//!
//! Cuts one utterance out of a live sample stream: speech starts when a chunk
//! is louder than the threshold and ends after a pause, or when the phrase
//! limit is reached.

use std::time::Duration;

use super::SAMPLE_RATE;

/// Minimum duration of speech kept as an utterance (in samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// State of the segmenter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// Waiting for speech
    Idle,
    /// Speech started, accumulating
    Speaking,
}

/// Result of feeding one chunk
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Need more audio
    Pending,
    /// A full utterance
    Complete(Vec<f32>),
    /// No speech started before the listen timeout
    TimedOut,
}

/// Splits a sample stream into utterances
#[derive(Debug)]
pub struct UtteranceSegmenter {
    threshold: f32,
    pause_samples: usize,
    phrase_limit_samples: usize,
    timeout_samples: usize,
    state: SegmenterState,
    speech_buffer: Vec<f32>,
    silence_counter: usize,
    waited: usize,
}

impl UtteranceSegmenter {
    /// Create a segmenter
    ///
    /// # Arguments
    ///
    /// * `threshold` - RMS energy above which a chunk counts as speech
    /// * `pause` - Silence that ends an utterance
    /// * `phrase_limit` - Longest utterance before it is cut
    /// * `listen_timeout` - How long to wait for speech to start
    #[must_use]
    pub fn new(threshold: f32, pause: Duration, phrase_limit: Duration, listen_timeout: Duration) -> Self {
        Self {
            threshold,
            pause_samples: duration_to_samples(pause),
            phrase_limit_samples: duration_to_samples(phrase_limit),
            timeout_samples: duration_to_samples(listen_timeout),
            state: SegmenterState::Idle,
            speech_buffer: Vec::new(),
            silence_counter: 0,
            waited: 0,
        }
    }

    /// Feed captured samples
    pub fn push(&mut self, samples: &[f32]) -> Segment {
        let energy = calculate_energy(samples);
        let is_speech = energy > self.threshold;

        match self.state {
            SegmenterState::Idle => {
                if is_speech {
                    self.state = SegmenterState::Speaking;
                    self.speech_buffer.clear();
                    self.speech_buffer.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech detected");
                } else {
                    self.waited += samples.len();
                    if self.waited >= self.timeout_samples {
                        self.reset();
                        return Segment::TimedOut;
                    }
                }
            }
            SegmenterState::Speaking => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.speech_buffer.len() >= self.phrase_limit_samples {
                    tracing::debug!(samples = self.speech_buffer.len(), "phrase limit reached");
                    return self.finish();
                }

                if self.silence_counter >= self.pause_samples {
                    if self.speech_buffer.len() > MIN_SPEECH_SAMPLES + self.silence_counter {
                        tracing::debug!(samples = self.speech_buffer.len(), "utterance complete");
                        return self.finish();
                    }
                    // Too short to be speech; keep waiting
                    tracing::trace!("noise burst discarded");
                    self.waited += self.speech_buffer.len();
                    self.state = SegmenterState::Idle;
                    self.speech_buffer.clear();
                    self.silence_counter = 0;
                }
            }
        }

        Segment::Pending
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SegmenterState {
        self.state
    }

    /// Reset to idle, dropping buffered audio and the wait so far
    pub fn reset(&mut self) {
        self.state = SegmenterState::Idle;
        self.speech_buffer.clear();
        self.silence_counter = 0;
        self.waited = 0;
    }

    fn finish(&mut self) -> Segment {
        let utterance = std::mem::take(&mut self.speech_buffer);
        self.reset();
        Segment::Complete(utterance)
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn duration_to_samples(duration: Duration) -> usize {
    (duration.as_secs_f64() * f64::from(SAMPLE_RATE)) as usize
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
pub fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
