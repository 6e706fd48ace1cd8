//! Wake word gating
//!
//! Transcripts are only dispatched when they contain the wake word. Other
//! transcripts get a reminder, rotating through a fixed set of phrasings.

/// Case-insensitive wake word matcher over transcripts
#[derive(Debug, Clone)]
pub struct WakeWord {
    word: String,
}

impl WakeWord {
    /// Create a matcher for one wake word
    #[must_use]
    pub fn new(word: &str) -> Self {
        let word = word.trim().to_lowercase();
        tracing::debug!(wake_word = word, "wake word configured");
        Self { word }
    }

    /// Normalized wake word
    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Whether the transcript contains the wake word
    ///
    /// Plain containment on normalized text: "cookies" still carries
    /// "cookie".
    #[must_use]
    pub fn matches(&self, transcript: &str) -> bool {
        if self.word.is_empty() {
            return false;
        }

        let normalized: String = transcript
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        let collapsed = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

        let detected = collapsed.contains(&self.word);
        if detected {
            tracing::info!(wake_word = self.word, transcript, "wake word detected");
        }
        detected
    }
}

/// Rotating reminders spoken when the wake word is missing
#[derive(Debug, Clone)]
pub struct Reminders {
    phrases: Vec<String>,
    next: usize,
}

impl Reminders {
    /// Reminder phrasings built around the wake word
    #[must_use]
    pub fn new(wake_word: &str) -> Self {
        let phrases = vec![
            format!("Please start your command with '{wake_word}'."),
            format!("I only respond to commands that include '{wake_word}'."),
            format!("Try saying '{wake_word}' followed by your command."),
            format!("Say '{wake_word}' first so I know you're talking to me."),
        ];
        Self { phrases, next: 0 }
    }

    /// The next reminder, cycling back to the first after the last
    pub fn next_reminder(&mut self) -> &str {
        let index = self.next;
        self.next = (self.next + 1) % self.phrases.len();
        &self.phrases[index]
    }
}
