// src/config/mod.rs

//! Configuration loading and validation for thingrun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate value ranges (`validate.rs`).
//!
//! Command-line flags are layered on top by [`ConfigFile::with_overrides`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{ConfigFile, RawConfigFile, RunSection, WorkSection};
pub use validate::validate_config;

use crate::errors::Result;
use crate::types::FinalizePolicy;

/// Values that may override the config file, typically from the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub concurrency: Option<usize>,
    pub steps: Option<u32>,
    pub min_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub finalize: Option<FinalizePolicy>,
}

impl ConfigFile {
    /// Apply overrides and re-validate the result.
    pub fn with_overrides(self, overrides: Overrides) -> Result<ConfigFile> {
        let mut raw = RawConfigFile {
            run: self.run,
            work: self.work,
        };

        if let Some(n) = overrides.concurrency {
            raw.run.concurrency = n;
        }
        if let Some(policy) = overrides.finalize {
            raw.run.finalize = policy;
        }
        if let Some(steps) = overrides.steps {
            raw.work.steps = steps;
        }
        if let Some(ms) = overrides.min_delay_ms {
            raw.work.min_delay_ms = ms;
        }
        if let Some(ms) = overrides.max_delay_ms {
            raw.work.max_delay_ms = ms;
        }

        ConfigFile::try_from(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Delay;

    #[test]
    fn overrides_replace_file_values() {
        let cfg = ConfigFile::default()
            .with_overrides(Overrides {
                concurrency: Some(8),
                min_delay_ms: Some(0),
                max_delay_ms: Some(0),
                finalize: Some(FinalizePolicy::Partial),
                ..Overrides::default()
            })
            .unwrap();

        assert_eq!(cfg.run.concurrency, 8);
        assert_eq!(cfg.run.finalize, FinalizePolicy::Partial);
        assert_eq!(cfg.work.steps, 10);
        assert!(matches!(cfg.pacing().delay, Delay::None));
    }

    #[test]
    fn invalid_override_is_rejected() {
        let result = ConfigFile::default().with_overrides(Overrides {
            concurrency: Some(0),
            ..Overrides::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn default_pacing_is_uniform() {
        let pacing = ConfigFile::default().pacing();
        assert_eq!(pacing.steps, 10);
        assert!(matches!(pacing.delay, Delay::Uniform { .. }));
    }

    #[test]
    fn equal_bounds_give_fixed_delay() {
        let cfg = ConfigFile::default()
            .with_overrides(Overrides {
                min_delay_ms: Some(20),
                max_delay_ms: Some(20),
                ..Overrides::default()
            })
            .unwrap();
        assert!(matches!(cfg.pacing().delay, Delay::Fixed(d) if d.as_millis() == 20));
    }
}
