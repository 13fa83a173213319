//! Progress reporting for long-running analyses.
//!
//! The engine pushes `(current, total, label)` ticks into a [`ProgressSink`]
//! and never blocks on it; ticks may arrive in any order from parallel
//! workers.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

pub trait ProgressSink: Send + Sync {
    fn tick(&self, current: usize, total: usize, label: &str);
}

/// Sink that ignores all ticks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn tick(&self, _current: usize, _total: usize, _label: &str) {}
}

/// Terminal progress bar for interactive consumers.
#[derive(Clone)]
pub struct TerminalProgress {
    bar: Arc<ProgressBar>,
}

impl TerminalProgress {
    pub fn new(total: u64, message: &str) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
                .unwrap()
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_message(message.to_string());
        Self { bar: Arc::new(bar) }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for TerminalProgress {
    fn tick(&self, current: usize, _total: usize, label: &str) {
        self.bar.set_position(current as u64);
        if !label.is_empty() {
            self.bar.set_message(label.to_string());
        }
    }
}
