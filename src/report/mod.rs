// src/report/mod.rs

//! Progress sinks: where relayed progress ends up.
//!
//! The engine talks to a [`ProgressSink`] through three calls:
//! - `register` once per item, before the item is admitted;
//! - `update` zero or more times while the item's task runs;
//! - `finalize` exactly once when the item's progress stream closes.
//!
//! - [`bars`] renders one terminal progress bar per item (`indicatif`).
//! - [`log`] writes progress as `tracing` events, for non-interactive runs.

pub mod bars;
pub mod log;

use crate::engine::progress::MAX_PROGRESS;
use crate::engine::TaskOutcome;
use crate::items::WorkItem;
use crate::types::FinalizePolicy;

pub use bars::BarSink;
pub use log::LogSink;

/// Handle for a tracker registered with a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackerId(pub usize);

/// Where an item sits in the batch (`index` is zero-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemPosition {
    pub index: usize,
    pub total: usize,
}

/// Terminal state handed to [`ProgressSink::finalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerFinish {
    pub outcome: TaskOutcome,
    /// Percentage the tracker should end on.
    pub shown: u8,
}

impl TrackerFinish {
    pub fn new(outcome: TaskOutcome, last: Option<u8>, policy: FinalizePolicy) -> Self {
        let shown = match (outcome, policy) {
            (TaskOutcome::Completed, _) | (_, FinalizePolicy::Complete) => MAX_PROGRESS,
            (_, FinalizePolicy::Partial) => last.unwrap_or(0),
        };
        Self { outcome, shown }
    }
}

/// Consumer of per-item progress.
///
/// Calls for different items may arrive concurrently from different relays,
/// so implementations use interior mutability.
pub trait ProgressSink: Send + Sync {
    fn register(&self, item: &WorkItem, position: ItemPosition) -> TrackerId;

    fn update(&self, tracker: TrackerId, value: u8);

    fn finalize(&self, tracker: TrackerId, finish: TrackerFinish);
}
