// tests/error_handling.rs

use std::io::Write;

use tempfile::NamedTempFile;
use thingrun::config::load_and_validate;
use thingrun::errors::ThingrunError;
use thingrun::items::{load_items, LoadOptions};

#[test]
fn zero_concurrency_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[run]
concurrency = 0
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(ThingrunError::ConfigError(msg)) => {
            assert!(msg.contains("concurrency"));
            assert!(msg.contains(">= 1"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_key_returns_toml_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[run]
concurency = 2
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(ThingrunError::TomlError(_)) => {}
        Err(e) => panic!("Expected TomlError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn bad_finalize_policy_returns_toml_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[run]
finalize = "sometimes"
"#
    )
    .unwrap();

    assert!(matches!(
        load_and_validate(file.path()),
        Err(ThingrunError::TomlError(_))
    ));
}

#[test]
fn missing_config_file_returns_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ThingrunError::IoError(_))));
}

#[test]
fn missing_input_file_returns_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.csv");

    match load_items(&path, LoadOptions::default()) {
        Err(ThingrunError::Load { path: reported, .. }) => assert_eq!(reported, path),
        Err(e) => panic!("Expected Load error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn malformed_input_reports_path_and_line() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "alpha,a,1\nbeta\n").unwrap();

    match load_items(file.path(), LoadOptions::default()) {
        Err(ThingrunError::Load { path, reason }) => {
            assert_eq!(path, file.path());
            assert!(reason.contains("line 2"), "reason: {reason}");
        }
        Err(e) => panic!("Expected Load error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}
