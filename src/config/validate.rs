// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, ThingrunError};
use crate::engine::MAX_PROGRESS;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ThingrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.run, raw.work))
    }
}

/// Check the semantic invariants serde cannot express.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_run_section(cfg)?;
    validate_work_section(cfg)?;
    Ok(())
}

fn validate_run_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.run.concurrency == 0 {
        return Err(ThingrunError::ConfigError(
            "[run].concurrency must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.run.relay_buffer == 0 {
        return Err(ThingrunError::ConfigError(
            "[run].relay_buffer must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_work_section(cfg: &RawConfigFile) -> Result<()> {
    let steps = cfg.work.steps;
    if steps == 0 || steps > u32::from(MAX_PROGRESS) {
        return Err(ThingrunError::ConfigError(format!(
            "[work].steps must be between 1 and {MAX_PROGRESS} (got {steps})"
        )));
    }

    if cfg.work.min_delay_ms > cfg.work.max_delay_ms {
        return Err(ThingrunError::ConfigError(format!(
            "[work].min_delay_ms ({}) must not exceed max_delay_ms ({})",
            cfg.work.min_delay_ms, cfg.work.max_delay_ms
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
        assert_eq!(cfg.run.concurrency, 3);
        assert_eq!(cfg.work.steps, 10);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.run.concurrency = 0;

        match ConfigFile::try_from(raw) {
            Err(ThingrunError::ConfigError(msg)) => assert!(msg.contains("concurrency")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn steps_outside_progress_range_are_rejected() {
        let mut raw = RawConfigFile::default();
        raw.work.steps = 101;
        assert!(ConfigFile::try_from(raw).is_err());
    }

    #[test]
    fn inverted_delay_bounds_are_rejected() {
        let mut raw = RawConfigFile::default();
        raw.work.min_delay_ms = 10;
        raw.work.max_delay_ms = 5;
        assert!(ConfigFile::try_from(raw).is_err());
    }
}
