// src/logging.rs

//! Logging setup for `thingrun` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `THINGRUN_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Logs are sent to STDERR, the same stream the progress bars are drawn on,
//! so stdout only carries the dry-run listing. While bars are attached with
//! [`attach_bars`], every log line is written with the bars suspended so the
//! two never interleave.

use std::io::{self, IsTerminal, Write};
use std::sync::{Mutex, PoisonError};

use anyhow::{anyhow, Result};
use indicatif::MultiProgress;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::MakeWriter;

use crate::cli::LogLevel;

/// Initialise global logging subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("THINGRUN_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(StderrAboveBars)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))
}

static ACTIVE_BARS: Mutex<Option<MultiProgress>> = Mutex::new(None);

/// Route log output around `bars` until the returned guard is dropped.
pub fn attach_bars(bars: &MultiProgress) -> BarsAttached {
    *ACTIVE_BARS.lock().unwrap_or_else(PoisonError::into_inner) = Some(bars.clone());
    BarsAttached { _private: () }
}

/// Detaches the bars from log output on drop.
#[must_use = "bars are detached as soon as the guard is dropped"]
pub struct BarsAttached {
    _private: (),
}

impl Drop for BarsAttached {
    fn drop(&mut self) {
        *ACTIVE_BARS.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

fn active_bars() -> Option<MultiProgress> {
    ACTIVE_BARS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

#[derive(Debug, Clone, Copy, Default)]
struct StderrAboveBars;

impl<'a> MakeWriter<'a> for StderrAboveBars {
    type Writer = LineWriter<io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter::new(io::stderr(), active_bars())
    }
}

/// Buffers one formatted event and writes it out on drop, suspending `bars`
/// (if any) around the write.
struct LineWriter<W: Write> {
    buf: Vec<u8>,
    out: W,
    bars: Option<MultiProgress>,
}

impl<W: Write> LineWriter<W> {
    fn new(out: W, bars: Option<MultiProgress>) -> Self {
        Self {
            buf: Vec::new(),
            out,
            bars,
        }
    }
}

impl<W: Write> Write for LineWriter<W> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<W: Write> Drop for LineWriter<W> {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let Self { buf, out, bars } = self;
        let mut emit = || {
            // Nowhere to report a failed log write.
            let _ = out.write_all(buf).and_then(|()| out.flush());
        };
        match bars {
            Some(bars) => bars.suspend(emit),
            None => emit(),
        }
    }
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
