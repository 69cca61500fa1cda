// src/report/log.rs

//! Sink that reports progress through `tracing`.

use std::sync::{Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::engine::TaskOutcome;
use crate::items::WorkItem;

use super::{ItemPosition, ProgressSink, TrackerFinish, TrackerId};

/// Logs every registration, update and finalization.
///
/// Updates are logged at debug level; registration and finalization at info.
#[derive(Debug, Default)]
pub struct LogSink {
    labels: Mutex<Vec<String>>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn label(&self, tracker: TrackerId) -> String {
        let labels = self.labels.lock().unwrap_or_else(PoisonError::into_inner);
        labels.get(tracker.0).cloned().unwrap_or_default()
    }
}

impl ProgressSink for LogSink {
    fn register(&self, item: &WorkItem, position: ItemPosition) -> TrackerId {
        let mut labels = self.labels.lock().unwrap_or_else(PoisonError::into_inner);
        let id = TrackerId(labels.len());
        labels.push(format!(
            "Creating {}/{} | {}",
            position.index + 1,
            position.total,
            item.label()
        ));
        info!(item = %item.id(), label = %labels[id.0], "queued");
        id
    }

    fn update(&self, tracker: TrackerId, value: u8) {
        debug!(label = %self.label(tracker), progress = value, "progress");
    }

    fn finalize(&self, tracker: TrackerId, finish: TrackerFinish) {
        let label = self.label(tracker);
        match finish.outcome {
            TaskOutcome::Completed => info!(label = %label, "done"),
            TaskOutcome::Cancelled => {
                info!(label = %label, progress = finish.shown, "cancelled")
            }
            TaskOutcome::Failed => warn!(label = %label, progress = finish.shown, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::ItemId;

    #[test]
    fn labels_follow_registration_order() {
        let sink = LogSink::new();
        let a = sink.register(&WorkItem::new(ItemId(0), "alpha"), ItemPosition { index: 0, total: 2 });
        let b = sink.register(&WorkItem::new(ItemId(1), "beta"), ItemPosition { index: 1, total: 2 });

        assert_eq!(sink.label(a), "Creating 1/2 | alpha");
        assert_eq!(sink.label(b), "Creating 2/2 | beta");
    }

    #[test]
    fn unknown_tracker_has_empty_label() {
        let sink = LogSink::new();
        sink.update(TrackerId(7), 50);
        assert_eq!(sink.label(TrackerId(7)), "");
    }
}
