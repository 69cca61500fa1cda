#![allow(dead_code)]

use std::sync::Arc;

use thingrun::config::{ConfigFile, RawConfigFile};
use thingrun::engine::{Pacing, Scheduler, SchedulerOptions, SimulatedTask, WorkTask};
use thingrun::items::{ItemId, WorkItem};
use thingrun::report::ProgressSink;
use thingrun::types::FinalizePolicy;

/// `n` items labelled `thing-0`, `thing-1`, ...
pub fn items(n: usize) -> Vec<Arc<WorkItem>> {
    (0..n)
        .map(|i| {
            Arc::new(
                WorkItem::new(ItemId(i), format!("thing-{i}"))
                    .with_field("description", format!("test thing {i}"))
                    .with_field("value", i.to_string()),
            )
        })
        .collect()
}

/// Builder for a `Scheduler` with test-friendly defaults: zero-delay
/// ten-step simulated work and a caller-supplied sink.
pub struct SchedulerBuilder {
    task: Arc<dyn WorkTask>,
    options: SchedulerOptions,
}

impl SchedulerBuilder {
    pub fn new() -> Self {
        Self {
            task: Arc::new(SimulatedTask::new(Pacing::instant(10))),
            options: SchedulerOptions::default(),
        }
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.options.concurrency = n;
        self
    }

    pub fn relay_buffer(mut self, n: usize) -> Self {
        self.options.relay_buffer = n;
        self
    }

    pub fn finalize(mut self, policy: FinalizePolicy) -> Self {
        self.options.finalize = policy;
        self
    }

    pub fn pacing(mut self, pacing: Pacing) -> Self {
        self.task = Arc::new(SimulatedTask::new(pacing));
        self
    }

    pub fn task(mut self, task: Arc<dyn WorkTask>) -> Self {
        self.task = task;
        self
    }

    pub fn build(self, sink: Arc<dyn ProgressSink>) -> Scheduler {
        Scheduler::new(self.task, sink, self.options).expect("Failed to build scheduler")
    }
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.run.concurrency = n;
        self
    }

    pub fn steps(mut self, n: u32) -> Self {
        self.config.work.steps = n;
        self
    }

    pub fn delay_ms(mut self, min: u64, max: u64) -> Self {
        self.config.work.min_delay_ms = min;
        self.config.work.max_delay_ms = max;
        self
    }

    pub fn finalize(mut self, policy: FinalizePolicy) -> Self {
        self.config.run.finalize = policy;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
