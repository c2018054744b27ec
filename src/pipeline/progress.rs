//! Cosmetic console progress for long builds

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner ticking on a fixed interval while a build runs.
///
/// The ticker is stopped when [`ProgressIndicator::stop`] is called or the
/// indicator is dropped, whichever comes first.
#[derive(Debug)]
pub struct ProgressIndicator {
    bar: Option<ProgressBar>,
}

impl ProgressIndicator {
    pub fn disabled() -> Self {
        Self { bar: None }
    }

    pub fn start(enabled: bool, interval: Duration, message: impl Into<String>) -> Self {
        if !enabled {
            return Self::disabled();
        }

        let style = ProgressStyle::default_spinner()
            .template("{msg}{spinner} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&[".", "..", "...", "....", "....."]);

        let bar = ProgressBar::new_spinner();
        bar.set_style(style);
        bar.set_message(message.into());
        bar.enable_steady_tick(interval);

        Self { bar: Some(bar) }
    }

    pub fn is_running(&self) -> bool {
        self.bar.is_some()
    }

    pub fn stop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_indicator_never_runs() {
        let progress = ProgressIndicator::start(false, Duration::from_millis(10), "building");
        assert!(!progress.is_running());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut progress = ProgressIndicator::start(true, Duration::from_millis(10), "building");
        assert!(progress.is_running());

        progress.stop();
        assert!(!progress.is_running());
        progress.stop();
    }
}
