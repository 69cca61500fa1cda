// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine::admission::AdmissionError;

#[derive(Error, Debug)]
pub enum ThingrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The upstream item source could not be read; nothing was started.
    #[error("failed to load work items from {path:?}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("Admission error: {0}")]
    Admission(#[from] AdmissionError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ThingrunError>;
