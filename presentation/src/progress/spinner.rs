//! Spinner shown while a blocking reply is pending

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct WaitSpinner {
    bar: ProgressBar,
}

impl WaitSpinner {
    /// Start spinning with `message` next to the spinner.
    pub fn start(message: impl Into<String>) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(Self::style());
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Hidden spinner, for quiet mode and non-interactive output.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn finish(self) {
        self.bar.finish_and_clear();
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}
