//! Row layouts of the two supported CSV schemas and their conversion into
//! validated [`ProductionRecord`]s

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::config::AnalysisConfig;
use crate::error::LoadError;
use crate::types::ProductionRecord;

/// Layout detected from the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvSchema {
    /// One column per record field
    Canonical,
    /// Per-shift target/actual/defect counts; times derived from shift length
    Legacy,
}

impl CsvSchema {
    /// Detect the schema from header names (case-insensitive).
    ///
    /// # Errors
    ///
    /// [`LoadError::MissingColumn`] naming the first required column absent
    /// from the closest-matching schema.
    pub fn detect(headers: &[String]) -> Result<Self, LoadError> {
        let has = |name: &str| headers.iter().any(|h| h == name);

        let (schema, required): (Self, &[&str]) = if has("planned_production_time") {
            (CsvSchema::Canonical, CANONICAL_REQUIRED)
        } else if has("target_production") || has("actual_production") {
            (CsvSchema::Legacy, LEGACY_REQUIRED)
        } else {
            (CsvSchema::Canonical, CANONICAL_REQUIRED)
        };

        if let Some(missing) = required.iter().find(|c| !has(c)) {
            return Err(LoadError::MissingColumn((*missing).to_string()));
        }
        if schema == CsvSchema::Canonical && !has("good_units") && !has("defective_units") {
            return Err(LoadError::MissingColumn("good_units".to_string()));
        }
        Ok(schema)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CsvSchema::Canonical => "canonical",
            CsvSchema::Legacy => "legacy",
        }
    }
}

const CANONICAL_REQUIRED: &[&str] = &[
    "timestamp",
    "planned_production_time",
    "actual_runtime",
    "ideal_cycle_time",
    "units_produced",
    "units_target",
];

const LEGACY_REQUIRED: &[&str] = &[
    "timestamp",
    "target_production",
    "actual_production",
    "downtime_minutes",
    "quality_defects",
];

// ============================================================================
// Raw rows
// ============================================================================

#[derive(Debug, Deserialize)]
pub(super) struct CanonicalRow {
    timestamp: String,
    machine_id: Option<String>,
    shift: Option<String>,
    operator_id: Option<String>,
    planned_production_time: f64,
    actual_runtime: f64,
    ideal_cycle_time: f64,
    units_produced: u64,
    units_target: u64,
    good_units: Option<u64>,
    defective_units: Option<u64>,
    downtime_minutes: Option<f64>,
    downtime_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LegacyRow {
    timestamp: String,
    machine_id: Option<String>,
    operator_id: Option<String>,
    shift: Option<String>,
    target_production: u64,
    actual_production: u64,
    downtime_minutes: f64,
    quality_defects: u64,
}

fn invalid(line: u64, message: impl Into<String>) -> LoadError {
    LoadError::Invalid { line, message: message.into() }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Parse `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` or a bare date
/// (midnight).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn timestamp(raw: &str, line: u64) -> Result<NaiveDateTime, LoadError> {
    parse_timestamp(raw).ok_or_else(|| invalid(line, format!("unparsable timestamp '{raw}'")))
}

fn duration(name: &str, value: f64, line: u64) -> Result<f64, LoadError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(line, format!("{name} must be a non-negative number, got {value}")));
    }
    Ok(value)
}

impl CanonicalRow {
    pub(super) fn into_record(self, line: u64) -> Result<ProductionRecord, LoadError> {
        let timestamp = timestamp(&self.timestamp, line)?;
        let planned = duration("planned_production_time", self.planned_production_time, line)?;
        let runtime = duration("actual_runtime", self.actual_runtime, line)?;
        let ideal = duration("ideal_cycle_time", self.ideal_cycle_time, line)?;
        let downtime = match self.downtime_minutes {
            Some(m) => duration("downtime_minutes", m, line)?,
            None => (planned - runtime).max(0.0),
        };

        if runtime > planned {
            return Err(invalid(
                line,
                format!("actual_runtime {runtime} exceeds planned_production_time {planned}"),
            ));
        }
        if downtime > planned {
            return Err(invalid(
                line,
                format!("downtime_minutes {downtime} exceeds planned_production_time {planned}"),
            ));
        }

        let produced = self.units_produced;
        let (good, defective) = match (self.good_units, self.defective_units) {
            (Some(g), Some(d)) => (g, d),
            (Some(g), None) => {
                let d = produced.checked_sub(g).ok_or_else(|| {
                    invalid(line, format!("good_units {g} exceeds units_produced {produced}"))
                })?;
                (g, d)
            }
            (None, Some(d)) => {
                let g = produced.checked_sub(d).ok_or_else(|| {
                    invalid(line, format!("defective_units {d} exceeds units_produced {produced}"))
                })?;
                (g, d)
            }
            (None, None) => {
                return Err(invalid(line, "good_units and defective_units both empty"));
            }
        };
        if defective > produced {
            return Err(invalid(
                line,
                format!("defective_units {defective} exceeds units_produced {produced}"),
            ));
        }
        if good.checked_add(defective) != Some(produced) {
            return Err(invalid(
                line,
                format!("good_units {good} + defective_units {defective} != units_produced {produced}"),
            ));
        }

        Ok(ProductionRecord {
            timestamp,
            machine_id: non_empty(self.machine_id),
            shift: non_empty(self.shift),
            operator_id: non_empty(self.operator_id),
            planned_production_time: planned,
            actual_runtime: runtime,
            ideal_cycle_time: ideal,
            units_produced: produced,
            units_target: self.units_target,
            good_units: good,
            defective_units: defective,
            downtime_minutes: downtime,
            downtime_reason: non_empty(self.downtime_reason),
        })
    }
}

impl LegacyRow {
    /// Map onto the canonical model with `shift.shift_minutes` as planned time.
    ///
    /// Returns the record and whether downtime had to be clamped.
    pub(super) fn into_record(
        self,
        line: u64,
        config: &AnalysisConfig,
    ) -> Result<(ProductionRecord, bool), LoadError> {
        let timestamp = timestamp(&self.timestamp, line)?;
        let shift_minutes = config.shift.shift_minutes;
        let raw_downtime = duration("downtime_minutes", self.downtime_minutes, line)?;
        let clamped = raw_downtime > shift_minutes;
        let downtime = raw_downtime.min(shift_minutes);

        let produced = self.actual_production;
        let defective = self.quality_defects;
        let good = produced.checked_sub(defective).ok_or_else(|| {
            invalid(line, format!("quality_defects {defective} exceeds actual_production {produced}"))
        })?;

        let ideal_cycle_time = if self.target_production == 0 {
            0.0
        } else {
            shift_minutes / self.target_production as f64
        };

        let record = ProductionRecord {
            timestamp,
            machine_id: non_empty(self.machine_id),
            shift: non_empty(self.shift),
            operator_id: non_empty(self.operator_id),
            planned_production_time: shift_minutes,
            actual_runtime: (shift_minutes - downtime).max(0.0),
            ideal_cycle_time,
            units_produced: produced,
            units_target: self.target_production,
            good_units: good,
            defective_units: defective,
            downtime_minutes: downtime,
            downtime_reason: None,
        };
        Ok((record, clamped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_detect_schemas() {
        let canonical = headers(&[
            "timestamp", "machine_id", "planned_production_time", "actual_runtime",
            "ideal_cycle_time", "units_produced", "units_target", "good_units",
        ]);
        assert_eq!(CsvSchema::detect(&canonical).unwrap(), CsvSchema::Canonical);

        let legacy = headers(&[
            "timestamp", "machine_id", "operator_id", "shift", "target_production",
            "actual_production", "downtime_minutes", "quality_defects", "setup_time_minutes",
        ]);
        assert_eq!(CsvSchema::detect(&legacy).unwrap(), CsvSchema::Legacy);
    }

    #[test]
    fn test_detect_reports_missing_column() {
        let partial = headers(&["timestamp", "planned_production_time", "actual_runtime"]);
        match CsvSchema::detect(&partial) {
            Err(LoadError::MissingColumn(c)) => assert_eq!(c, "ideal_cycle_time"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-03-04 06:00:00").is_some());
        assert!(parse_timestamp("2024-03-04T06:00:00").is_some());
        let midnight = parse_timestamp("2024-03-04").unwrap();
        assert_eq!(midnight.format("%H:%M").to_string(), "00:00");
        assert!(parse_timestamp("04/03/2024").is_none());
    }

    #[test]
    fn test_legacy_mapping() {
        let row = LegacyRow {
            timestamp: "2024-03-04 06:00:00".to_string(),
            machine_id: Some("A1".to_string()),
            operator_id: Some(String::new()),
            shift: Some("Morning".to_string()),
            target_production: 800,
            actual_production: 700,
            downtime_minutes: 30.0,
            quality_defects: 14,
        };
        let (r, clamped) = row.into_record(2, &AnalysisConfig::default()).unwrap();
        assert!(!clamped);
        assert_eq!(r.planned_production_time, 480.0);
        assert_eq!(r.actual_runtime, 450.0);
        assert!((r.ideal_cycle_time - 0.6).abs() < 1e-12);
        assert_eq!(r.good_units, 686);
        assert_eq!(r.operator_id, None);
    }

    #[test]
    fn test_legacy_downtime_clamped_to_shift() {
        let row = LegacyRow {
            timestamp: "2024-03-04".to_string(),
            machine_id: None,
            operator_id: None,
            shift: None,
            target_production: 0,
            actual_production: 0,
            downtime_minutes: 600.0,
            quality_defects: 0,
        };
        let (r, clamped) = row.into_record(2, &AnalysisConfig::default()).unwrap();
        assert!(clamped);
        assert_eq!(r.downtime_minutes, 480.0);
        assert_eq!(r.actual_runtime, 0.0);
        assert_eq!(r.ideal_cycle_time, 0.0);
    }
}
