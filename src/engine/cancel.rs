// src/engine/cancel.rs

//! Cooperative cancellation.
//!
//! [`RunControl`] is the issuing side: it can cancel the whole run or a single
//! item. Each running task only ever sees a [`CancellationSignal`], a
//! read-only view that can be polled or awaited but never fired.
//!
//! Both are thin wrappers over `tokio_util`'s `CancellationToken`: every item
//! token is a child of the run token, so cancelling the run fans out to all
//! items, while cancelling one item leaves its siblings alone. Tokens fire at
//! most once and never reset.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::items::ItemId;

/// Issuer of run-wide and per-item cancellation.
///
/// Cheap to clone; all clones control the same run.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    root: CancellationToken,
    items: Arc<Mutex<HashMap<ItemId, CancellationToken>>>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every item of the run, including items not yet admitted.
    pub fn cancel(&self) {
        if !self.root.is_cancelled() {
            info!("run cancellation requested");
        }
        self.root.cancel();
    }

    /// Cancel a single item. Works before or after the item is admitted.
    pub fn cancel_item(&self, item: ItemId) {
        info!(item = %item, "item cancellation requested");
        self.token_for(item).cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Resolves once the whole run has been cancelled.
    pub async fn cancelled(&self) {
        self.root.cancelled().await
    }

    /// Observer view for one item.
    pub(crate) fn signal_for(&self, item: ItemId) -> CancellationSignal {
        CancellationSignal {
            token: self.token_for(item),
        }
    }

    fn token_for(&self, item: ItemId) -> CancellationToken {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items
            .entry(item)
            .or_insert_with(|| self.root.child_token())
            .clone()
    }
}

/// Read-only cancellation flag handed to a task.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    token: CancellationToken,
}

impl CancellationSignal {
    /// A signal nobody can fire. Useful for driving a task outside a run.
    pub fn never() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_cancel_reaches_every_item() {
        let control = RunControl::new();
        let a = control.signal_for(ItemId(0));
        let b = control.signal_for(ItemId(1));

        control.cancel();

        assert!(control.is_cancelled());
        assert!(a.is_cancelled());
        assert!(b.is_cancelled());
        // Items that show up after the fact are cancelled too.
        assert!(control.signal_for(ItemId(2)).is_cancelled());
    }

    #[test]
    fn item_cancel_leaves_siblings_running() {
        let control = RunControl::new();
        let a = control.signal_for(ItemId(0));
        let b = control.signal_for(ItemId(1));

        control.cancel_item(ItemId(0));

        assert!(a.is_cancelled());
        assert!(!b.is_cancelled());
        assert!(!control.is_cancelled());
    }

    #[test]
    fn item_cancelled_before_admission_stays_cancelled() {
        let control = RunControl::new();
        control.cancel_item(ItemId(3));
        assert!(control.signal_for(ItemId(3)).is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_future_resolves_after_fire() {
        let control = RunControl::new();
        let signal = control.signal_for(ItemId(0));

        let waiter = tokio::spawn(async move { signal.cancelled().await });
        control.cancel();
        waiter.await.unwrap();
    }
}
