// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::config::Overrides;
use crate::types::FinalizePolicy;

/// Command-line arguments for `thingrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "thingrun",
    version,
    about = "Create a batch of things concurrently, with a progress bar per thing.",
    long_about = None
)]
pub struct CliArgs {
    /// CSV file with one `name,description,value` record per line.
    #[arg(long, value_name = "PATH", default_value = "input.csv")]
    pub input: String,

    /// The input file starts with a header row.
    #[arg(long)]
    pub headers: bool,

    /// Path to the config file (TOML).
    ///
    /// Default: `Thingrun.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Maximum number of things created at the same time.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Number of progress steps per thing.
    #[arg(long, value_name = "N")]
    pub steps: Option<u32>,

    /// Lower bound of the per-step delay, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub min_delay_ms: Option<u64>,

    /// Upper bound of the per-step delay, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub max_delay_ms: Option<u64>,

    /// What a cancelled thing's bar shows at the end (complete, partial).
    #[arg(long, value_name = "POLICY")]
    pub finalize: Option<FinalizePolicy>,

    /// Cancel the whole run after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub cancel_after: Option<f64>,

    /// Report progress as log lines instead of progress bars.
    #[arg(long)]
    pub plain: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `THINGRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load + validate, print the items, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            concurrency: self.concurrency,
            steps: self.steps,
            min_delay_ms: self.min_delay_ms,
            max_delay_ms: self.max_delay_ms,
            finalize: self.finalize,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_become_overrides() {
        let args = CliArgs::try_parse_from([
            "thingrun",
            "--concurrency",
            "5",
            "--finalize",
            "partial",
            "--max-delay-ms",
            "0",
        ])
        .unwrap();

        assert_eq!(args.input, "input.csv");
        let overrides = args.overrides();
        assert_eq!(overrides.concurrency, Some(5));
        assert_eq!(overrides.finalize, Some(FinalizePolicy::Partial));
        assert_eq!(overrides.max_delay_ms, Some(0));
        assert_eq!(overrides.steps, None);
    }

    #[test]
    fn unknown_finalize_policy_is_a_parse_error() {
        assert!(CliArgs::try_parse_from(["thingrun", "--finalize", "maybe"]).is_err());
    }
}
