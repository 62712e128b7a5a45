use indicatif::{ProgressBar, ProgressStyle};

const TICKS: &[&str] = &["|", "/", "-", "\\", "✓"];

/// A rotating glyph shown while waiting on the provider.
pub struct Spinner {
    progress_bar: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        pb.set_style(style);
        pb.set_message(message.to_string());

        Self { progress_bar: pb }
    }

    /// Draws nothing; for tests and non-interactive use.
    pub fn hidden() -> Self {
        Self {
            progress_bar: ProgressBar::hidden(),
        }
    }

    /// Advances to the next glyph.
    pub fn tick(&self) {
        self.progress_bar.tick();
    }

    pub fn set_message(&self, msg: &str) {
        self.progress_bar.set_message(msg.to_string());
    }

    pub fn finish_success(&self, message: &str) {
        self.progress_bar.finish_with_message(message.to_string());
    }

    pub fn finish_error(&self, error: &str) {
        self.progress_bar.abandon_with_message(format!("Failed: {error}"));
    }
}
