// Wed Jan 15 2026 - Alex

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A steady-ticking stderr spinner for the capture phase. Hidden entirely
/// when `enabled` is false.
pub struct ProgressSpinner {
    spinner: ProgressBar,
}

impl ProgressSpinner {
    pub fn new(message: &str, enabled: bool) -> Self {
        let spinner = if enabled {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ");
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    pub fn set_message(&self, message: &str) {
        self.spinner.set_message(message.to_string());
    }

    pub fn success(&self, message: &str) {
        self.spinner.finish_with_message(format!("✓ {}", message));
    }

    pub fn failure(&self, message: &str) {
        self.spinner.finish_with_message(format!("✗ {}", message));
    }

    pub fn elapsed(&self) -> Duration {
        self.spinner.elapsed()
    }
}

impl Drop for ProgressSpinner {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
