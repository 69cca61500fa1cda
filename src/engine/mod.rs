// src/engine/mod.rs

//! Concurrency and progress engine.
//!
//! This module ties together:
//! - the admission gate that bounds how many items run at once
//! - the per-item progress channel and the relay that drains it into a sink
//! - cooperative cancellation, run-wide and per item
//! - the run ledger that records every item's lifecycle
//! - the scheduler that drives a whole batch to completion
//!
//! The task being run is pluggable through [`WorkTask`]; the built-in
//! [`SimulatedTask`] models slow work with configurable pacing.

/// How a task run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Every step ran.
    Completed,
    /// The task observed its cancellation signal and stopped early.
    Cancelled,
    /// The task could not finish (panic, broken progress stream).
    Failed,
}

pub mod admission;
pub mod cancel;
pub mod ledger;
pub mod progress;
pub mod relay;
pub mod scheduler;
pub mod task;

pub use admission::{AdmissionController, AdmissionError, AdmissionPermit};
pub use cancel::{CancellationSignal, RunControl};
pub use ledger::{ItemState, RunLedger};
pub use progress::{ProgressEvent, ProgressReporter, ProgressStream, MAX_PROGRESS};
pub use relay::RelayReport;
pub use scheduler::{RunReport, Scheduler, SchedulerOptions};
pub use task::{Delay, Pacing, SimulatedTask, WorkTask};
