// Mon Oct 19 2026 - Alex

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const SPINNER_TEMPLATE: &str = "{spinner:.cyan} [{elapsed_precise}] {msg}";

/// One spinner per pipeline stage; hidden when progress is disabled.
#[derive(Debug, Clone, Copy)]
pub struct ProgressManager {
    enabled: bool,
}

impl ProgressManager {
    pub fn new() -> Self {
        Self { enabled: true }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn stage(&self, message: &str) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template(SPINNER_TEMPLATE) {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    /// Run `f` under a spinner, clearing it afterwards whatever the outcome.
    pub fn run<T, F>(&self, message: &str, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let pb = self.stage(message);
        let result = f();
        pb.finish_and_clear();
        result
    }
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}
