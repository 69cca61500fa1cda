// src/report/bars.rs

//! Terminal progress bars, one per item, stacked in a `MultiProgress`.

use std::sync::{Mutex, PoisonError};

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::engine::progress::MAX_PROGRESS;
use crate::engine::TaskOutcome;
use crate::items::WorkItem;

use super::{ItemPosition, ProgressSink, TrackerFinish, TrackerId};

const BAR_TEMPLATE: &str = "{prefix} [{bar:25.green/dim}] {msg:>9}";

/// Renders `Creating i/n | name [█████░░░] 40%` lines and ends each line with
/// `Done`, `Cancelled` or `Failed`.
pub struct BarSink {
    multi_progress: MultiProgress,
    bars: Mutex<Vec<ProgressBar>>,
}

impl BarSink {
    /// Bars drawn to stderr.
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    pub fn with_draw_target(target: ProgressDrawTarget) -> Self {
        Self {
            multi_progress: MultiProgress::with_draw_target(target),
            bars: Mutex::new(Vec::new()),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("██░")
    }

    fn bar(&self, tracker: TrackerId) -> Option<ProgressBar> {
        let bars = self.bars.lock().unwrap_or_else(PoisonError::into_inner);
        bars.get(tracker.0).cloned()
    }

    /// The stack the bars are drawn in; used to print log lines above it.
    pub fn multi_progress(&self) -> &MultiProgress {
        &self.multi_progress
    }

    /// Current position of a tracker's bar (for diagnostics and tests).
    pub fn position(&self, tracker: TrackerId) -> Option<u64> {
        self.bar(tracker).map(|bar| bar.position())
    }

    /// Whether a tracker's bar has been finished or abandoned.
    pub fn is_finished(&self, tracker: TrackerId) -> Option<bool> {
        self.bar(tracker).map(|bar| bar.is_finished())
    }
}

impl Default for BarSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarSink {
    fn register(&self, item: &WorkItem, position: ItemPosition) -> TrackerId {
        let bar = self
            .multi_progress
            .add(ProgressBar::new(u64::from(MAX_PROGRESS)));
        bar.set_style(Self::style());
        bar.set_prefix(format!(
            "Creating {}/{} | {}",
            position.index + 1,
            position.total,
            item.label()
        ));
        bar.set_message("0%");

        let mut bars = self.bars.lock().unwrap_or_else(PoisonError::into_inner);
        bars.push(bar);
        TrackerId(bars.len() - 1)
    }

    fn update(&self, tracker: TrackerId, value: u8) {
        if let Some(bar) = self.bar(tracker) {
            bar.set_position(u64::from(value));
            bar.set_message(format!("{value}%"));
        }
    }

    fn finalize(&self, tracker: TrackerId, finish: TrackerFinish) {
        let Some(bar) = self.bar(tracker) else {
            return;
        };
        bar.set_position(u64::from(finish.shown));
        match finish.outcome {
            TaskOutcome::Completed => bar.finish_with_message("Done"),
            TaskOutcome::Cancelled => bar.abandon_with_message("Cancelled"),
            TaskOutcome::Failed => bar.abandon_with_message("Failed"),
        }
    }
}
