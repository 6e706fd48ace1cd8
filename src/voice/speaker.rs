//! Spoken responses

use async_trait::async_trait;

/// Voice output
///
/// Speaking never fails from the caller's point of view.
#[async_trait]
pub trait Speaker: Send + Sync {
    /// Say `text` and return once it has been spoken
    async fn speak(&self, text: &str);
}

/// Speaks through a system command such as `say` or `espeak`
#[derive(Debug, Clone)]
pub struct SystemSpeaker {
    program: String,
    args: Vec<String>,
}

impl SystemSpeaker {
    /// Build from a command line; the text is appended as the last argument
    ///
    /// An empty command only logs what would have been said.
    #[must_use]
    pub fn new(command: &str) -> Self {
        let mut parts = command.split_whitespace().map(ToString::to_string);
        let program = parts.next().unwrap_or_default();
        Self {
            program,
            args: parts.collect(),
        }
    }
}

#[async_trait]
impl Speaker for SystemSpeaker {
    async fn speak(&self, text: &str) {
        tracing::info!(text, "speaking");

        if self.program.is_empty() {
            return;
        }

        let status = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .status()
            .await;

        match status {
            Ok(status) if status.success() => {}
            Ok(status) => {
                tracing::warn!(program = self.program, code = status.code(), "speech command failed");
            }
            Err(e) => tracing::warn!(program = self.program, error = %e, "failed to run speech command"),
        }
    }
}
