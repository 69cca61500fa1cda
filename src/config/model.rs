// src/config/model.rs

use serde::Deserialize;

use crate::engine::{Delay, Pacing, SchedulerOptions};
use crate::types::FinalizePolicy;

use std::time::Duration;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [run]
/// concurrency = 3
/// relay_buffer = 1
/// finalize = "complete"
///
/// [work]
/// steps = 10
/// min_delay_ms = 500
/// max_delay_ms = 1500
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub work: WorkSection,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub run: RunSection,
    pub work: WorkSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(run: RunSection, work: WorkSection) -> Self {
        Self { run, work }
    }

    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            concurrency: self.run.concurrency,
            relay_buffer: self.run.relay_buffer,
            finalize: self.run.finalize,
        }
    }

    pub fn pacing(&self) -> Pacing {
        let min = Duration::from_millis(self.work.min_delay_ms);
        let max = Duration::from_millis(self.work.max_delay_ms);
        let delay = if max.is_zero() {
            Delay::None
        } else if min == max {
            Delay::Fixed(min)
        } else {
            Delay::Uniform { min, max }
        };
        Pacing {
            steps: self.work.steps,
            delay,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RunSection::default(), WorkSection::default())
    }
}

/// `[run]` section: how the batch is scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    /// Maximum number of items running at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Progress events buffered between a task and its relay.
    #[serde(default = "default_relay_buffer")]
    pub relay_buffer: usize,

    /// `"complete"` or `"partial"`.
    #[serde(default)]
    pub finalize: FinalizePolicy,
}

fn default_concurrency() -> usize {
    3
}

fn default_relay_buffer() -> usize {
    1
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            relay_buffer: default_relay_buffer(),
            finalize: FinalizePolicy::default(),
        }
    }
}

/// `[work]` section: pacing of the simulated work.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkSection {
    /// Number of progress steps per item.
    #[serde(default = "default_steps")]
    pub steps: u32,

    /// Lower bound (inclusive) of the per-step delay.
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound (exclusive) of the per-step delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_steps() -> u32 {
    10
}

fn default_min_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    1500
}

impl Default for WorkSection {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}
