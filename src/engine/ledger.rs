// src/engine/ledger.rs

//! Per-run bookkeeping of item states.
//!
//! The ledger is the single record of where every item is in its lifecycle:
//!
//! ```text
//! Pending -> Admitted -> Running -> Completed | Cancelled | Failed
//! Pending -> Cancelled            (run cancelled before admission)
//! ```
//!
//! Transitions only move forward; an attempt to go backwards or to leave a
//! terminal state is ignored and logged. The ledger also tracks how many
//! items are `Running` at once, so the concurrency cap can be checked after
//! the fact.
//!
//! The lock is never held across an `.await`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::engine::TaskOutcome;
use crate::items::ItemId;

/// Lifecycle state of one item in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ItemState {
    Pending,
    Admitted,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl ItemState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ItemState::Completed | ItemState::Cancelled | ItemState::Failed
        )
    }

    fn can_move_to(self, next: ItemState) -> bool {
        use ItemState::*;
        matches!(
            (self, next),
            (Pending, Admitted)
                | (Pending, Cancelled)
                | (Admitted, Running)
                | (Running, Completed)
                | (Running, Cancelled)
                | (Running, Failed)
        )
    }
}

impl From<TaskOutcome> for ItemState {
    fn from(outcome: TaskOutcome) -> Self {
        match outcome {
            TaskOutcome::Completed => ItemState::Completed,
            TaskOutcome::Cancelled => ItemState::Cancelled,
            TaskOutcome::Failed => ItemState::Failed,
        }
    }
}

#[derive(Debug, Default)]
struct LedgerInner {
    states: BTreeMap<ItemId, ItemState>,
    running: usize,
    peak_running: usize,
}

/// Shared, cloneable view of the run's item states.
#[derive(Debug, Clone, Default)]
pub struct RunLedger {
    inner: Arc<Mutex<LedgerInner>>,
}

impl RunLedger {
    /// A ledger with every given item `Pending`.
    pub fn new(items: impl IntoIterator<Item = ItemId>) -> Self {
        let states = items
            .into_iter()
            .map(|id| (id, ItemState::Pending))
            .collect();
        Self {
            inner: Arc::new(Mutex::new(LedgerInner {
                states,
                ..LedgerInner::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move `item` to `next`. Returns whether the transition was applied.
    pub fn transition(&self, item: ItemId, next: ItemState) -> bool {
        let mut inner = self.lock();
        let Some(current) = inner.states.get(&item).copied() else {
            warn!(item = %item, ?next, "transition for unknown item ignored");
            return false;
        };

        if !current.can_move_to(next) {
            warn!(item = %item, from = ?current, to = ?next, "illegal item transition ignored");
            return false;
        }

        inner.states.insert(item, next);
        if next == ItemState::Running {
            inner.running += 1;
            inner.peak_running = inner.peak_running.max(inner.running);
        } else if current == ItemState::Running {
            inner.running -= 1;
        }

        debug!(item = %item, from = ?current, to = ?next, running = inner.running, "item transition");
        true
    }

    /// Mark `item` as `Running` and return a guard that settles it.
    ///
    /// If the guard is dropped without [`RunningGuard::settle`] (the task
    /// panicked), the item is marked `Failed`.
    pub fn start(&self, item: ItemId) -> RunningGuard {
        self.transition(item, ItemState::Running);
        RunningGuard {
            ledger: self.clone(),
            item,
            settled: false,
        }
    }

    pub fn state_of(&self, item: ItemId) -> Option<ItemState> {
        self.lock().states.get(&item).copied()
    }

    pub fn running(&self) -> usize {
        self.lock().running
    }

    pub fn peak_running(&self) -> usize {
        self.lock().peak_running
    }

    /// True once every item has reached a terminal state.
    pub fn is_done(&self) -> bool {
        self.lock().states.values().all(|s| s.is_terminal())
    }

    /// Snapshot of all item states in item order.
    pub fn snapshot(&self) -> Vec<(ItemId, ItemState)> {
        self.lock()
            .states
            .iter()
            .map(|(id, state)| (*id, *state))
            .collect()
    }
}

/// Keeps an item `Running` until settled or dropped.
#[derive(Debug)]
pub struct RunningGuard {
    ledger: RunLedger,
    item: ItemId,
    settled: bool,
}

impl RunningGuard {
    pub fn settle(mut self, outcome: TaskOutcome) {
        self.settled = true;
        self.ledger.transition(self.item, outcome.into());
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        if !self.settled {
            self.ledger.transition(self.item, ItemState::Failed);
        }
    }
}
