// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod items;
pub mod logging;
pub mod report;
pub mod types;

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{load_or_default, ConfigFile};
use crate::engine::{RunControl, RunReport, Scheduler, SimulatedTask};
use crate::items::{load_items, LoadOptions, WorkItem};
use crate::report::{BarSink, LogSink, ProgressSink};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + CLI overrides)
/// - item loading (fatal before anything starts)
/// - progress sink selection (bars or log lines)
/// - the scheduler and its simulated task
/// - Ctrl-C and `--cancel-after` cancellation
pub async fn run(args: CliArgs) -> Result<()> {
    run_with_report(args).await.map(|_| ())
}

/// Same as [`run`], but hands back the final [`RunReport`].
///
/// Returns `None` for `--dry-run`, where nothing is executed.
pub async fn run_with_report(args: CliArgs) -> Result<Option<RunReport>> {
    let cfg = load_or_default(args.config.as_deref().map(Path::new))?
        .with_overrides(args.overrides())?;

    let items = load_items(
        &args.input,
        LoadOptions {
            has_headers: args.headers,
        },
    )?;

    if args.dry_run {
        print_dry_run(&cfg, &items);
        return Ok(None);
    }

    let control = RunControl::new();

    // Ctrl-C → cancel every item; the run still drains before returning.
    {
        let control = control.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            control.cancel();
        });
    }

    if let Some(secs) = args.cancel_after {
        let deadline = cancel_after_duration(secs)?;
        let control = control.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            warn!(after = ?deadline, "deadline reached; cancelling run");
            control.cancel();
        });
    }

    // Log lines are printed above the bars while they are drawn.
    let bars = (!args.plain && std::io::stderr().is_terminal()).then(BarSink::new);
    let _bars_attached = bars
        .as_ref()
        .map(|bars| logging::attach_bars(bars.multi_progress()));
    let sink: Arc<dyn ProgressSink> = match bars {
        Some(bars) => Arc::new(bars),
        None => Arc::new(LogSink::new()),
    };

    let task = Arc::new(SimulatedTask::new(cfg.pacing()));
    let scheduler = Scheduler::new(task, sink, cfg.scheduler_options())?;

    let report = scheduler.run(&items, &control).await;
    debug!(states = ?report.states, "final item states");

    if control.is_cancelled() {
        info!(
            completed = report.completed(),
            cancelled = report.cancelled(),
            "run was cancelled"
        );
    }

    Ok(Some(report))
}

fn cancel_after_duration(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        bail!("--cancel-after must be a non-negative number of seconds (got {secs})");
    }
    match Duration::try_from_secs_f64(secs) {
        Ok(duration) => Ok(duration),
        Err(e) => bail!("--cancel-after {secs} is out of range: {e}"),
    }
}

/// Simple dry-run output: print settings and items.
fn print_dry_run(cfg: &ConfigFile, items: &[Arc<WorkItem>]) {
    println!("thingrun dry-run");
    println!("  run.concurrency = {}", cfg.run.concurrency);
    println!("  run.relay_buffer = {}", cfg.run.relay_buffer);
    println!("  run.finalize = {:?}", cfg.run.finalize);
    println!("  work.steps = {}", cfg.work.steps);
    println!(
        "  work.delay = {}..{} ms",
        cfg.work.min_delay_ms, cfg.work.max_delay_ms
    );
    println!();

    println!("items ({}):", items.len());
    for item in items {
        println!("  - {}", item.label());
        for (key, value) in item.payload() {
            println!("      {key}: {value}");
        }
    }

    debug!("dry-run complete (no execution)");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_after_rejects_negative_nan_and_huge_values() {
        assert!(cancel_after_duration(-1.0).is_err());
        assert!(cancel_after_duration(f64::NAN).is_err());
        assert!(cancel_after_duration(f64::INFINITY).is_err());
        assert!(cancel_after_duration(1e30).is_err());
        assert!(cancel_after_duration(1e300).is_err());
        assert_eq!(
            cancel_after_duration(1.5).unwrap(),
            Duration::from_millis(1500)
        );
    }
}
