// src/engine/progress.rs

//! Per-item progress stream.
//!
//! A [`ProgressReporter`] is the producing half held by a running task; a
//! [`ProgressStream`] is the consuming half drained by the relay. The channel
//! is a bounded single-producer/single-consumer queue, so a slow consumer
//! back-pressures the task by at most `capacity` events.
//!
//! Values are whole percentages in `0..=MAX_PROGRESS` and must never go
//! backwards. The stream ends with an explicit [`ProgressEvent::Closed`]
//! marker carrying the task's outcome. If the reporter is dropped without
//! being closed (e.g. the task panicked), the stream simply ends and the
//! consumer treats the item as failed.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::trace;

use crate::engine::TaskOutcome;
use crate::items::ItemId;

/// Upper bound of the progress range.
pub const MAX_PROGRESS: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// New progress value for the item.
    Update(u8),
    /// No more events will follow.
    Closed(TaskOutcome),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgressError {
    #[error("progress value {0} is outside 0..=100")]
    OutOfRange(u8),

    #[error("progress went backwards: {previous} -> {next}")]
    Regressed { previous: u8, next: u8 },

    #[error("progress consumer is gone")]
    Disconnected,
}

/// Create a reporter/stream pair for one item.
///
/// `capacity` is clamped to at least 1.
pub fn channel(item: ItemId, capacity: usize) -> (ProgressReporter, ProgressStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        ProgressReporter {
            item,
            tx,
            last: None,
        },
        ProgressStream { item, rx },
    )
}

/// Producing half of an item's progress stream.
#[derive(Debug)]
pub struct ProgressReporter {
    item: ItemId,
    tx: mpsc::Sender<ProgressEvent>,
    last: Option<u8>,
}

impl ProgressReporter {
    /// Emit a progress value.
    ///
    /// Waits while the consumer's buffer is full. Rejects values that are out
    /// of range or lower than the previously reported one; repeating the
    /// previous value is allowed.
    pub async fn report(&mut self, value: u8) -> Result<(), ProgressError> {
        if value > MAX_PROGRESS {
            return Err(ProgressError::OutOfRange(value));
        }
        if let Some(previous) = self.last {
            if value < previous {
                return Err(ProgressError::Regressed {
                    previous,
                    next: value,
                });
            }
        }

        self.tx
            .send(ProgressEvent::Update(value))
            .await
            .map_err(|_| ProgressError::Disconnected)?;
        self.last = Some(value);
        trace!(item = %self.item, value, "progress reported");
        Ok(())
    }

    /// Last value accepted by [`report`](Self::report).
    pub fn last(&self) -> Option<u8> {
        self.last
    }

    pub fn item(&self) -> ItemId {
        self.item
    }

    /// Close the stream with the task's outcome.
    ///
    /// Consuming `self` guarantees at most one closing marker per stream.
    pub async fn close(self, outcome: TaskOutcome) {
        // A consumer that already went away has nothing left to finalize.
        let _ = self.tx.send(ProgressEvent::Closed(outcome)).await;
    }
}

/// Consuming half of an item's progress stream.
#[derive(Debug)]
pub struct ProgressStream {
    item: ItemId,
    rx: mpsc::Receiver<ProgressEvent>,
}

impl ProgressStream {
    /// Next event, or `None` once the reporter is gone.
    pub async fn next(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }

    pub fn item(&self) -> ItemId {
        self.item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_arrive_in_order_and_end_with_close_marker() {
        let (mut reporter, mut stream) = channel(ItemId(0), 8);

        reporter.report(10).await.unwrap();
        reporter.report(10).await.unwrap();
        reporter.report(40).await.unwrap();
        reporter.close(TaskOutcome::Completed).await;

        assert_eq!(stream.next().await, Some(ProgressEvent::Update(10)));
        assert_eq!(stream.next().await, Some(ProgressEvent::Update(10)));
        assert_eq!(stream.next().await, Some(ProgressEvent::Update(40)));
        assert_eq!(
            stream.next().await,
            Some(ProgressEvent::Closed(TaskOutcome::Completed))
        );
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn regressions_and_out_of_range_values_are_rejected() {
        let (mut reporter, mut stream) = channel(ItemId(0), 8);

        reporter.report(50).await.unwrap();
        assert_eq!(
            reporter.report(20).await,
            Err(ProgressError::Regressed {
                previous: 50,
                next: 20
            })
        );
        assert_eq!(reporter.report(101).await, Err(ProgressError::OutOfRange(101)));
        assert_eq!(reporter.last(), Some(50));

        drop(reporter);
        assert_eq!(stream.next().await, Some(ProgressEvent::Update(50)));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn report_fails_once_consumer_is_dropped() {
        let (mut reporter, stream) = channel(ItemId(0), 1);
        drop(stream);

        assert_eq!(reporter.report(10).await, Err(ProgressError::Disconnected));
        assert_eq!(reporter.last(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn full_buffer_back_pressures_the_reporter() {
        let (mut reporter, mut stream) = channel(ItemId(0), 1);
        reporter.report(10).await.unwrap();

        let blocked = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            reporter.report(20),
        )
        .await;
        assert!(blocked.is_err(), "second report should wait for the consumer");

        assert_eq!(stream.next().await, Some(ProgressEvent::Update(10)));
        reporter.report(20).await.unwrap();
        assert_eq!(stream.next().await, Some(ProgressEvent::Update(20)));
    }
}
