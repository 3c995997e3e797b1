//! Error types for the KPI engine and the CSV loader

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of an analysis call. Zero denominators are not errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KpiError {
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Unknown group field: {0} (expected machine, shift, operator or date)")]
    UnknownGroupField(String),
}

/// Failures while reading production records.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error reading {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Invalid record at line {line}: {message}")]
    Invalid { line: u64, message: String },
}
