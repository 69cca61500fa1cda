// src/engine/task.rs

//! The unit of execution run for each admitted item.
//!
//! - [`WorkTask`] is the contract every task implementation satisfies.
//! - [`SimulatedTask`] is the built-in implementation: it spends a
//!   configurable amount of time per step and reports evenly spaced progress.
//!   Its timing comes from an injectable [`Pacing`], so tests can run it with
//!   no delay at all.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::engine::cancel::CancellationSignal;
use crate::engine::progress::{ProgressReporter, MAX_PROGRESS};
use crate::engine::TaskOutcome;
use crate::items::WorkItem;

/// Trait abstracting the work done for one item.
///
/// Implementations must:
/// - check `cancel` before every progress emission and return
///   [`TaskOutcome::Cancelled`] as soon as it is set;
/// - only report non-decreasing values in `0..=MAX_PROGRESS`.
///
/// The caller closes the progress stream with the returned outcome, so the
/// task does not need to.
pub trait WorkTask: Send + Sync {
    fn run<'a>(
        &'a self,
        item: &'a WorkItem,
        progress: &'a mut ProgressReporter,
        cancel: &'a CancellationSignal,
    ) -> Pin<Box<dyn Future<Output = TaskOutcome> + Send + 'a>>;
}

/// How long one step of simulated work takes.
#[derive(Clone, Default)]
pub enum Delay {
    /// No waiting at all (deterministic tests).
    #[default]
    None,
    /// The same delay for every step.
    Fixed(Duration),
    /// Uniformly random in `[min, max)`; `min` when the range is empty.
    Uniform { min: Duration, max: Duration },
    /// Delay computed from the (1-based) step number.
    Custom(Arc<dyn Fn(u32) -> Duration + Send + Sync>),
}

impl fmt::Debug for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delay::None => f.write_str("None"),
            Delay::Fixed(d) => f.debug_tuple("Fixed").field(d).finish(),
            Delay::Uniform { min, max } => f
                .debug_struct("Uniform")
                .field("min", min)
                .field("max", max)
                .finish(),
            Delay::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Delay {
    pub fn for_step(&self, step: u32) -> Duration {
        match self {
            Delay::None => Duration::ZERO,
            Delay::Fixed(d) => *d,
            Delay::Uniform { min, max } if min >= max => *min,
            Delay::Uniform { min, max } => rand::thread_rng().gen_range(*min..*max),
            Delay::Custom(f) => f(step),
        }
    }
}

/// Step count plus per-step delay of a [`SimulatedTask`].
#[derive(Debug, Clone)]
pub struct Pacing {
    pub steps: u32,
    pub delay: Delay,
}

impl Pacing {
    /// `steps` steps with no delay between them.
    pub fn instant(steps: u32) -> Self {
        Self {
            steps,
            delay: Delay::None,
        }
    }

    /// Progress value reported after `step` of `steps` (1-based).
    ///
    /// Evenly spaced; the last step always reports `MAX_PROGRESS`.
    pub fn value_at(&self, step: u32) -> u8 {
        let steps = u64::from(self.steps.max(1));
        let step = u64::from(step).min(steps);
        (step * u64::from(MAX_PROGRESS) / steps) as u8
    }
}

impl Default for Pacing {
    /// Ten steps of 10%, each taking 500-1500ms.
    fn default() -> Self {
        Self {
            steps: 10,
            delay: Delay::Uniform {
                min: Duration::from_millis(500),
                max: Duration::from_millis(1500),
            },
        }
    }
}

/// Built-in task modelling slow asynchronous work.
///
/// Each step waits for the step's delay, then checks for cancellation, then
/// reports the next progress value. The wait itself is not interrupted by
/// cancellation; the check right after it is.
#[derive(Debug, Clone, Default)]
pub struct SimulatedTask {
    pacing: Pacing,
}

impl SimulatedTask {
    pub fn new(pacing: Pacing) -> Self {
        Self { pacing }
    }

    pub fn pacing(&self) -> &Pacing {
        &self.pacing
    }
}

impl WorkTask for SimulatedTask {
    fn run<'a>(
        &'a self,
        item: &'a WorkItem,
        progress: &'a mut ProgressReporter,
        cancel: &'a CancellationSignal,
    ) -> Pin<Box<dyn Future<Output = TaskOutcome> + Send + 'a>> {
        Box::pin(async move {
            for step in 1..=self.pacing.steps {
                if cancel.is_cancelled() {
                    debug!(item = %item.id(), step, "cancelled before step");
                    return TaskOutcome::Cancelled;
                }

                let delay = self.pacing.delay.for_step(step);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }

                if cancel.is_cancelled() {
                    debug!(item = %item.id(), step, "cancelled before reporting");
                    return TaskOutcome::Cancelled;
                }

                if let Err(err) = progress.report(self.pacing.value_at(step)).await {
                    warn!(item = %item.id(), step, error = %err, "failed to report progress");
                    return TaskOutcome::Failed;
                }
            }

            TaskOutcome::Completed
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::progress::{self, ProgressEvent};
    use crate::items::ItemId;

    #[test]
    fn values_are_evenly_spaced_and_end_at_max() {
        let pacing = Pacing::instant(10);
        let values: Vec<u8> = (1..=10).map(|s| pacing.value_at(s)).collect();
        assert_eq!(values, vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);

        let uneven = Pacing::instant(3);
        assert_eq!(uneven.value_at(1), 33);
        assert_eq!(uneven.value_at(3), 100);
    }

    #[test]
    fn huge_step_counts_do_not_overflow() {
        let pacing = Pacing::instant(u32::MAX);
        assert_eq!(pacing.value_at(1), 0);
        assert_eq!(pacing.value_at(u32::MAX / 2), 49);
        assert_eq!(pacing.value_at(u32::MAX), 100);
    }

    #[test]
    fn uniform_delay_stays_in_range() {
        let delay = Delay::Uniform {
            min: Duration::from_millis(5),
            max: Duration::from_millis(10),
        };
        for step in 1..=50 {
            let d = delay.for_step(step);
            assert!(d >= Duration::from_millis(5) && d < Duration::from_millis(10));
        }

        let empty = Delay::Uniform {
            min: Duration::from_millis(7),
            max: Duration::from_millis(7),
        };
        assert_eq!(empty.for_step(1), Duration::from_millis(7));
    }

    #[test]
    fn custom_delay_sees_step_number() {
        let delay = Delay::Custom(Arc::new(|step| Duration::from_millis(u64::from(step))));
        assert_eq!(delay.for_step(4), Duration::from_millis(4));
    }

    #[tokio::test]
    async fn runs_all_steps_when_not_cancelled() {
        let task = SimulatedTask::new(Pacing::instant(4));
        let item = WorkItem::new(ItemId(0), "alpha");
        let (mut reporter, mut stream) = progress::channel(item.id(), 16);

        let outcome = task
            .run(&item, &mut reporter, &CancellationSignal::never())
            .await;
        assert_eq!(outcome, TaskOutcome::Completed);
        drop(reporter);

        let mut seen = Vec::new();
        while let Some(ProgressEvent::Update(v)) = stream.next().await {
            seen.push(v);
        }
        assert_eq!(seen, vec![25, 50, 75, 100]);
    }

    #[tokio::test]
    async fn stops_at_next_checkpoint_after_cancellation() {
        let control = crate::engine::RunControl::new();
        let signal = control.signal_for(ItemId(0));
        let fire = control.clone();
        let task = SimulatedTask::new(Pacing {
            steps: 10,
            delay: Delay::Custom(Arc::new(move |step| {
                // Cancel while "working" on the third step.
                if step == 3 {
                    fire.cancel();
                }
                Duration::ZERO
            })),
        });
        let item = WorkItem::new(ItemId(0), "alpha");
        let (mut reporter, _stream) = progress::channel(item.id(), 16);

        let outcome = task.run(&item, &mut reporter, &signal).await;

        assert_eq!(outcome, TaskOutcome::Cancelled);
        assert_eq!(reporter.last(), Some(20));
    }
}
