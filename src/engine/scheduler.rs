// src/engine/scheduler.rs

//! Batch launcher.
//!
//! For each item, in input order, the [`Scheduler`]:
//! 1. registers a tracker with the sink,
//! 2. waits for an admission slot (or for run-wide cancellation),
//! 3. spawns a worker that runs the task while holding the slot,
//! 4. spawns a relay that forwards the item's progress to the sink.
//!
//! [`Scheduler::run`] only returns once every worker and every relay has
//! finished, so no task, slot or tracker outlives the run.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::engine::admission::{AdmissionController, AdmissionPermit};
use crate::engine::cancel::{CancellationSignal, RunControl};
use crate::engine::ledger::{ItemState, RunLedger};
use crate::engine::progress::{self, ProgressReporter};
use crate::engine::relay::{relay, RelayReport};
use crate::engine::task::WorkTask;
use crate::engine::TaskOutcome;
use crate::errors::Result;
use crate::items::{ItemId, WorkItem};
use crate::report::{ItemPosition, ProgressSink, TrackerFinish};
use crate::types::FinalizePolicy;

/// Tunables of a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Maximum number of items running at once. Must be >= 1.
    pub concurrency: usize,
    /// Progress events buffered between a task and its relay.
    pub relay_buffer: usize,
    pub finalize: FinalizePolicy,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            concurrency: 3,
            relay_buffer: 1,
            finalize: FinalizePolicy::Complete,
        }
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Final state of every item, in item order.
    pub states: Vec<(ItemId, ItemState)>,
    /// Highest number of items that were `Running` at the same time.
    pub peak_running: usize,
    /// One report per item that got a relay (i.e. was admitted).
    pub relays: Vec<RelayReport>,
}

impl RunReport {
    pub fn state_of(&self, item: ItemId) -> Option<ItemState> {
        self.states
            .iter()
            .find(|(id, _)| *id == item)
            .map(|(_, state)| *state)
    }

    pub fn count(&self, state: ItemState) -> usize {
        self.states.iter().filter(|(_, s)| *s == state).count()
    }

    pub fn completed(&self) -> usize {
        self.count(ItemState::Completed)
    }

    pub fn cancelled(&self) -> usize {
        self.count(ItemState::Cancelled)
    }

    pub fn failed(&self) -> usize {
        self.count(ItemState::Failed)
    }

    pub fn is_done(&self) -> bool {
        self.states.iter().all(|(_, s)| s.is_terminal())
    }
}

/// Runs a batch of items through one task implementation under a
/// concurrency cap.
pub struct Scheduler {
    task: Arc<dyn WorkTask>,
    sink: Arc<dyn ProgressSink>,
    admission: AdmissionController,
    options: SchedulerOptions,
}

impl Scheduler {
    /// Fails if `options.concurrency` is zero.
    pub fn new(
        task: Arc<dyn WorkTask>,
        sink: Arc<dyn ProgressSink>,
        options: SchedulerOptions,
    ) -> Result<Self> {
        let admission = AdmissionController::new(options.concurrency)?;
        Ok(Self {
            task,
            sink,
            admission,
            options,
        })
    }

    pub fn options(&self) -> SchedulerOptions {
        self.options
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    /// Run every item and wait for all of them to finish.
    ///
    /// Cancelling `control` stops admitting new items and cancels the ones
    /// already running; the call still waits for every started task and relay
    /// before returning. Items that never got a slot are marked `Cancelled`
    /// and their trackers finalized directly.
    pub async fn run(&self, items: &[Arc<WorkItem>], control: &RunControl) -> RunReport {
        let total = items.len();
        let ledger = RunLedger::new(items.iter().map(|item| item.id()));
        let mut workers: Vec<(ItemId, JoinHandle<()>)> = Vec::with_capacity(total);
        let mut relays: Vec<(ItemId, JoinHandle<RelayReport>)> = Vec::with_capacity(total);

        info!(
            items = total,
            concurrency = self.admission.capacity(),
            "run started"
        );

        for (index, item) in items.iter().enumerate() {
            let id = item.id();
            let tracker = self.sink.register(item, ItemPosition { index, total });

            let admitted = tokio::select! {
                biased;
                _ = control.cancelled() => None,
                permit = self.admission.acquire() => match permit {
                    Ok(permit) => Some(permit),
                    Err(err) => {
                        error!(item = %id, error = %err, "admission failed");
                        None
                    }
                },
            };

            let Some(permit) = admitted else {
                debug!(item = %id, "not admitted; finalizing as cancelled");
                ledger.transition(id, ItemState::Cancelled);
                self.sink.finalize(
                    tracker,
                    TrackerFinish::new(TaskOutcome::Cancelled, None, self.options.finalize),
                );
                continue;
            };

            ledger.transition(id, ItemState::Admitted);
            debug!(
                item = %id,
                label = %item.label(),
                outstanding = self.admission.outstanding(),
                "item admitted"
            );

            let (reporter, stream) = progress::channel(id, self.options.relay_buffer);
            let worker = tokio::spawn(drive(
                Arc::clone(&self.task),
                Arc::clone(item),
                reporter,
                control.signal_for(id),
                ledger.clone(),
                permit,
            ));
            let relay_task = tokio::spawn(relay(
                stream,
                Arc::clone(&self.sink),
                tracker,
                self.options.finalize,
            ));

            workers.push((id, worker));
            relays.push((id, relay_task));
        }

        for (id, worker) in workers {
            if let Err(err) = worker.await {
                error!(item = %id, error = %err, "task panicked; item marked failed");
            }
        }

        let mut relay_reports = Vec::with_capacity(relays.len());
        for (id, relay_task) in relays {
            match relay_task.await {
                Ok(report) => relay_reports.push(report),
                Err(err) => error!(item = %id, error = %err, "progress relay panicked"),
            }
        }

        let report = RunReport {
            states: ledger.snapshot(),
            peak_running: ledger.peak_running(),
            relays: relay_reports,
        };

        info!(
            completed = report.completed(),
            cancelled = report.cancelled(),
            failed = report.failed(),
            peak_running = report.peak_running,
            "run finished"
        );

        report
    }
}

/// Worker body: run the task while holding the admission slot.
///
/// `_permit` is declared before `guard`, so on every exit path (including a
/// panic inside the task) the item leaves `Running` before the slot is
/// returned.
async fn drive(
    task: Arc<dyn WorkTask>,
    item: Arc<WorkItem>,
    mut reporter: ProgressReporter,
    signal: CancellationSignal,
    ledger: RunLedger,
    permit: AdmissionPermit,
) {
    let _permit = permit;
    let guard = ledger.start(item.id());

    let outcome = task.run(&item, &mut reporter, &signal).await;

    guard.settle(outcome);
    reporter.close(outcome).await;
    debug!(item = %item.id(), ?outcome, "task finished; releasing admission slot");
}
