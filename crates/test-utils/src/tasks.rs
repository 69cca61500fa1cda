use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, Notify};

use thingrun::engine::{CancellationSignal, ProgressReporter, TaskOutcome, WorkTask};
use thingrun::items::{ItemId, WorkItem};

/// Wraps another task so a test can observe when it starts and decide when
/// it may proceed.
///
/// On start the task notifies `started`, then waits on `release` before
/// delegating to the inner task.
pub struct GatedTask<T> {
    inner: T,
    started: Arc<Notify>,
    release: Arc<Notify>,
}

impl<T: WorkTask> GatedTask<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }

    /// Notified (once per task start) when a task enters `run`.
    pub fn started(&self) -> Arc<Notify> {
        Arc::clone(&self.started)
    }

    /// Notify this to let one waiting task proceed.
    pub fn release(&self) -> Arc<Notify> {
        Arc::clone(&self.release)
    }
}

impl<T: WorkTask> WorkTask for GatedTask<T> {
    fn run<'a>(
        &'a self,
        item: &'a WorkItem,
        progress: &'a mut ProgressReporter,
        cancel: &'a CancellationSignal,
    ) -> Pin<Box<dyn Future<Output = TaskOutcome> + Send + 'a>> {
        Box::pin(async move {
            self.started.notify_one();
            self.release.notified().await;
            self.inner.run(item, progress, cancel).await
        })
    }
}

/// A task that panics before reporting anything.
pub struct PanickingTask;

impl WorkTask for PanickingTask {
    fn run<'a>(
        &'a self,
        item: &'a WorkItem,
        _progress: &'a mut ProgressReporter,
        _cancel: &'a CancellationSignal,
    ) -> Pin<Box<dyn Future<Output = TaskOutcome> + Send + 'a>> {
        Box::pin(async move { explode(item) })
    }
}

fn explode(item: &WorkItem) -> TaskOutcome {
    panic!("task for {} blew up", item.label())
}

/// Dispatches to one task for labels in `special`, another for the rest.
pub struct SplitTask<A, B> {
    pub special: Vec<String>,
    pub when_special: A,
    pub otherwise: B,
}

impl<A: WorkTask, B: WorkTask> WorkTask for SplitTask<A, B> {
    fn run<'a>(
        &'a self,
        item: &'a WorkItem,
        progress: &'a mut ProgressReporter,
        cancel: &'a CancellationSignal,
    ) -> Pin<Box<dyn Future<Output = TaskOutcome> + Send + 'a>> {
        if self.special.iter().any(|l| l == item.label()) {
            self.when_special.run(item, progress, cancel)
        } else {
            self.otherwise.run(item, progress, cancel)
        }
    }
}

/// Reports `first` once, announces itself on a channel, then waits for its
/// cancellation signal.
pub struct UntilCancelledTask {
    first: u8,
    started_tx: mpsc::UnboundedSender<ItemId>,
}

impl UntilCancelledTask {
    /// Returns the task and a receiver yielding the id of every item that
    /// has reported its first value.
    pub fn new(first: u8) -> (Self, mpsc::UnboundedReceiver<ItemId>) {
        let (started_tx, started_rx) = mpsc::unbounded_channel();
        (Self { first, started_tx }, started_rx)
    }
}

impl WorkTask for UntilCancelledTask {
    fn run<'a>(
        &'a self,
        item: &'a WorkItem,
        progress: &'a mut ProgressReporter,
        cancel: &'a CancellationSignal,
    ) -> Pin<Box<dyn Future<Output = TaskOutcome> + Send + 'a>> {
        Box::pin(async move {
            if progress.report(self.first).await.is_err() {
                return TaskOutcome::Failed;
            }
            let _ = self.started_tx.send(item.id());
            cancel.cancelled().await;
            TaskOutcome::Cancelled
        })
    }
}
