// src/engine/relay.rs

//! Forwarding of one item's progress stream to the sink.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::engine::progress::{ProgressEvent, ProgressStream};
use crate::engine::TaskOutcome;
use crate::items::ItemId;
use crate::report::{ProgressSink, TrackerFinish, TrackerId};
use crate::types::FinalizePolicy;

/// What a relay saw for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayReport {
    pub item: ItemId,
    pub tracker: TrackerId,
    /// Number of `update` calls made on the sink.
    pub forwarded: usize,
    /// Last forwarded value, if any.
    pub last: Option<u8>,
    pub outcome: TaskOutcome,
}

/// Drain `stream` into `sink` until the stream closes, then finalize the
/// tracker exactly once.
///
/// A stream that ends without a `Closed` marker means the task never got to
/// close it (it panicked), and the item is finalized as failed.
pub async fn relay(
    mut stream: ProgressStream,
    sink: Arc<dyn ProgressSink>,
    tracker: TrackerId,
    policy: FinalizePolicy,
) -> RelayReport {
    let item = stream.item();
    let mut forwarded = 0;
    let mut last = None;

    let outcome = loop {
        match stream.next().await {
            Some(ProgressEvent::Update(value)) => {
                sink.update(tracker, value);
                forwarded += 1;
                last = Some(value);
            }
            Some(ProgressEvent::Closed(outcome)) => break outcome,
            None => {
                warn!(item = %item, "progress stream ended without close marker");
                break TaskOutcome::Failed;
            }
        }
    };

    let finish = TrackerFinish::new(outcome, last, policy);
    sink.finalize(tracker, finish);
    debug!(item = %item, ?outcome, forwarded, shown = finish.shown, "relay finished");

    RelayReport {
        item,
        tracker,
        forwarded,
        last,
        outcome,
    }
}
