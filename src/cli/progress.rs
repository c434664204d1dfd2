//! Terminal progress display

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::downloader::progress::{ProgressEvent, ProgressReporter, TracingReporter};

/// Spinner showing the current symbol and file count, with log lines
/// printed above it
pub struct ConsoleReporter {
    bar: ProgressBar,
    log: TracingReporter,
}

impl ConsoleReporter {
    /// Reporter drawing a spinner on stderr
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} files {msg}")
                .expect("hardcoded template is valid"),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self {
            bar,
            log: TracingReporter,
        }
    }

    /// Reporter that only logs (for JSON output)
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            log: TracingReporter,
        }
    }

    /// Remove the spinner
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Files counted so far
    pub fn files_downloaded(&self) -> u64 {
        self.bar.position()
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleReporter {
    fn report(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::SymbolStarted {
                granularity,
                index,
                total,
                symbol,
            } => {
                self.bar
                    .set_message(format!("[{index}/{total}] {granularity} {symbol}"));
            }
            ProgressEvent::FileDownloaded { .. } => self.bar.inc(1),
            _ => {}
        }
        self.bar.suspend(|| self.log.report(event));
    }
}
