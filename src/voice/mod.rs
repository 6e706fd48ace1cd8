//! Voice processing module
//!
//! Handles microphone capture, utterance segmentation, transcription, wake
//! word gating, and spoken responses.

mod capture;
mod listener;
mod segmenter;
mod speaker;
mod stt;
mod wake_word;

pub use capture::{AudioCapture, InputDevice, SAMPLE_RATE, list_input_devices, samples_to_wav};
pub use listener::{Listener, MicrophoneListener};
pub use segmenter::{Segment, SegmenterState, UtteranceSegmenter, calculate_energy};
pub use speaker::{Speaker, SystemSpeaker};
pub use stt::{SpeechToText, WHISPER_ENDPOINT};
pub use wake_word::{Reminders, WakeWord};
