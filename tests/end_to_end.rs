// tests/end_to_end.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::io::Write;
use std::time::{Duration, Instant};

use clap::Parser;
use tempfile::NamedTempFile;
use thingrun::cli::CliArgs;

type TestResult = Result<(), Box<dyn Error>>;

fn input_file(rows: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{rows}").unwrap();
    file
}

fn args(input: &NamedTempFile, extra: &[&str]) -> CliArgs {
    let path = input.path().to_string_lossy().to_string();
    let mut argv = vec!["thingrun", "--input", path.as_str(), "--plain"];
    argv.extend_from_slice(extra);
    CliArgs::try_parse_from(argv).unwrap()
}

#[tokio::test]
async fn runs_a_csv_batch_without_delays() -> TestResult {
    init_tracing();
    let input = input_file("alpha,first,1\nbeta,second,2\ngamma,third,3\n");

    let report = thingrun::run_with_report(args(
        &input,
        &["--concurrency", "2", "--min-delay-ms", "0", "--max-delay-ms", "0"],
    ))
    .await?
    .expect("a real run produces a report");

    assert_eq!(report.completed(), 3);
    assert_eq!(report.cancelled(), 0);
    assert!(report.peak_running <= 2);
    assert_eq!(report.relays.len(), 3);
    assert!(report.relays.iter().all(|r| r.last == Some(100)));

    Ok(())
}

#[tokio::test]
async fn dry_run_only_validates() -> TestResult {
    init_tracing();
    let input = input_file("name,description,value\nalpha,first,1\n");

    let report = thingrun::run_with_report(args(&input, &["--headers", "--dry-run"])).await?;
    assert!(report.is_none());

    Ok(())
}

#[tokio::test]
async fn load_failure_aborts_before_running() {
    init_tracing();
    let input = input_file("alpha,only-two-fields\n");

    let result = thingrun::run(args(&input, &["--max-delay-ms", "0", "--min-delay-ms", "0"])).await;

    let err = result.expect_err("malformed input must fail the run");
    assert!(format!("{err:#}").contains("failed to load work items"));
}

#[tokio::test]
async fn deadline_cancels_a_slow_run() -> TestResult {
    init_tracing();
    let input = input_file("alpha,first,1\nbeta,second,2\n");
    let started = Instant::now();

    // Each step takes 200ms; the run is cut off after 50ms, during the first
    // step of both items.
    let report = thingrun::run_with_report(args(
        &input,
        &[
            "--steps",
            "3",
            "--min-delay-ms",
            "200",
            "--max-delay-ms",
            "200",
            "--cancel-after",
            "0.05",
        ],
    ))
    .await?
    .expect("a real run produces a report");

    assert_eq!(report.completed(), 0);
    assert_eq!(report.cancelled(), 2);
    assert!(report.relays.iter().all(|r| r.forwarded == 0));
    // Uncancelled, the run would take 3 x 200ms.
    assert!(started.elapsed() < Duration::from_millis(500));

    Ok(())
}

#[tokio::test]
async fn out_of_range_deadline_is_an_error() {
    init_tracing();
    let input = input_file("alpha,first,1\n");

    let result = thingrun::run(args(&input, &["--cancel-after", "1e30"])).await;

    let err = result.expect_err("an unrepresentable deadline must be rejected");
    assert!(format!("{err:#}").contains("--cancel-after"));
}
