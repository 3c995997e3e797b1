//! CSV loader for production records
//!
//! Reads either of two layouts, auto-detected from the header row:
//!
//! **Canonical:** one column per [`ProductionRecord`] field
//! (`timestamp, machine_id, shift, operator_id, planned_production_time,
//! actual_runtime, ideal_cycle_time, units_produced, units_target,
//! good_units, defective_units, downtime_minutes, downtime_reason`).
//!
//! **Legacy:** per-shift counts (`target_production, actual_production,
//! downtime_minutes, quality_defects`); planned time is the configured
//! shift length and runtime is what the downtime leaves of it.
//!
//! Every row is validated here so the engine never sees an inconsistent
//! record. The first invalid row fails the whole load.
//!
//! # Usage
//!
//! ```ignore
//! use mfg_kpi::{config::AnalysisConfig, loader};
//!
//! let config = AnalysisConfig::default();
//! let records = loader::load_csv("data/sample_data.csv", &config)?;
//! ```

mod schema;

pub use schema::{parse_timestamp, CsvSchema};

use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::error::LoadError;
use crate::types::ProductionRecord;
use schema::{CanonicalRow, LegacyRow};

/// Load and validate every record in the CSV file at `path`.
///
/// # Errors
///
/// [`LoadError::Io`] if the file cannot be opened, otherwise any error of
/// [`read_records`].
pub fn load_csv(
    path: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<Vec<ProductionRecord>, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| LoadError::Io(path.to_path_buf(), e))?;
    let records = read_records(file, config)?;
    info!(file = %path.display(), records = records.len(), "Production data loaded");
    Ok(records)
}

/// Read and validate records from any CSV source.
///
/// # Errors
///
/// - [`LoadError::MissingColumn`] when the header fits neither schema
/// - [`LoadError::Invalid`] for the first row failing validation
/// - [`LoadError::Csv`] for malformed CSV
pub fn read_records<R: Read>(
    reader: R,
    config: &AnalysisConfig,
) -> Result<Vec<ProductionRecord>, LoadError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();
    let schema = CsvSchema::detect(&headers)?;
    let header_record = StringRecord::from(headers.clone());
    debug!(schema = schema.as_str(), columns = headers.len(), "CSV header parsed");

    let mut records = Vec::new();
    let mut clamped = 0usize;

    for row in csv_reader.records() {
        let row = row?;
        if row.iter().all(str::is_empty) {
            continue;
        }
        let line = row.position().map_or(0, csv::Position::line);

        let record = match schema {
            CsvSchema::Canonical => {
                let raw: CanonicalRow = deserialize(&row, &header_record, line)?;
                raw.into_record(line)?
            }
            CsvSchema::Legacy => {
                let raw: LegacyRow = deserialize(&row, &header_record, line)?;
                let (record, was_clamped) = raw.into_record(line, config)?;
                if was_clamped {
                    if clamped < 10 {
                        warn!(
                            line,
                            shift_minutes = config.shift.shift_minutes,
                            "Downtime exceeds shift length, clamped"
                        );
                    }
                    clamped += 1;
                }
                record
            }
        };
        records.push(record);
    }

    if clamped > 0 {
        warn!(rows = clamped, "Rows with downtime clamped to shift length");
    }
    debug!(schema = schema.as_str(), records = records.len(), "CSV rows validated");
    Ok(records)
}

fn deserialize<'de, T: serde::Deserialize<'de>>(
    row: &'de StringRecord,
    headers: &'de StringRecord,
    line: u64,
) -> Result<T, LoadError> {
    row.deserialize(Some(headers)).map_err(|e| {
        let message = match e.kind() {
            csv::ErrorKind::Deserialize { err, .. } => match err.field() {
                Some(i) => format!(
                    "column '{}': {}",
                    headers.get(i as usize).unwrap_or("?"),
                    err.kind()
                ),
                None => err.kind().to_string(),
            },
            _ => e.to_string(),
        };
        LoadError::Invalid { line, message }
    })
}
