use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use thingrun::items::{ItemId, WorkItem};
use thingrun::report::{ItemPosition, ProgressSink, TrackerFinish, TrackerId};

/// One call made on the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Register { item: ItemId, label: String },
    Update(u8),
    Finalize(TrackerFinish),
}

/// A sink that records every call, per item, in arrival order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    trackers: Arc<Mutex<Vec<ItemId>>>,
    calls: Arc<Mutex<BTreeMap<ItemId, Vec<SinkCall>>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls recorded for `item`.
    pub fn calls_for(&self, item: ItemId) -> Vec<SinkCall> {
        self.calls
            .lock()
            .unwrap()
            .get(&item)
            .cloned()
            .unwrap_or_default()
    }

    /// Progress values forwarded for `item`.
    pub fn updates_for(&self, item: ItemId) -> Vec<u8> {
        self.calls_for(item)
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Update(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    /// Finalize calls recorded for `item`.
    pub fn finalizes_for(&self, item: ItemId) -> Vec<TrackerFinish> {
        self.calls_for(item)
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Finalize(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    /// Items in registration order.
    pub fn registered(&self) -> Vec<ItemId> {
        self.trackers.lock().unwrap().clone()
    }

    fn record(&self, tracker: TrackerId, call: SinkCall) {
        let item = self.trackers.lock().unwrap()[tracker.0];
        self.calls
            .lock()
            .unwrap()
            .entry(item)
            .or_default()
            .push(call);
    }
}

impl ProgressSink for RecordingSink {
    fn register(&self, item: &WorkItem, _position: ItemPosition) -> TrackerId {
        let tracker = {
            let mut trackers = self.trackers.lock().unwrap();
            trackers.push(item.id());
            TrackerId(trackers.len() - 1)
        };
        self.record(
            tracker,
            SinkCall::Register {
                item: item.id(),
                label: item.label().to_string(),
            },
        );
        tracker
    }

    fn update(&self, tracker: TrackerId, value: u8) {
        self.record(tracker, SinkCall::Update(value));
    }

    fn finalize(&self, tracker: TrackerId, finish: TrackerFinish) {
        self.record(tracker, SinkCall::Finalize(finish));
    }
}
