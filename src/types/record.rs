//! Production record: one time-stamped manufacturing observation

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A single production observation (typically one machine-shift).
///
/// Records reaching the engine have already been validated by the loader:
/// durations and counts are non-negative, `actual_runtime` and
/// `downtime_minutes` never exceed `planned_production_time`, and
/// `good_units + defective_units == units_produced`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    /// When the observation started
    pub timestamp: NaiveDateTime,
    /// Machine / work-centre identifier
    pub machine_id: Option<String>,
    /// Shift name (e.g. "Morning")
    pub shift: Option<String>,
    /// Operator identifier
    pub operator_id: Option<String>,
    /// Planned production time (minutes)
    pub planned_production_time: f64,
    /// Time the equipment actually ran (minutes)
    pub actual_runtime: f64,
    /// Ideal time to produce one unit (minutes/unit)
    pub ideal_cycle_time: f64,
    /// Total units produced, good and defective
    pub units_produced: u64,
    /// Units the plan called for
    pub units_target: u64,
    /// Units that passed quality
    pub good_units: u64,
    /// Units rejected
    pub defective_units: u64,
    /// Unplanned stop time (minutes)
    pub downtime_minutes: f64,
    /// Stated cause of the downtime, if recorded
    pub downtime_reason: Option<String>,
}

impl ProductionRecord {
    /// Calendar date of the observation.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Value of a categorical dimension, treating empty strings as absent.
    pub fn dimension(&self, field: GroupField) -> Option<String> {
        let raw = match field {
            GroupField::Machine => self.machine_id.as_deref(),
            GroupField::Shift => self.shift.as_deref(),
            GroupField::Operator => self.operator_id.as_deref(),
            GroupField::Date => return Some(self.date().format("%Y-%m-%d").to_string()),
        };
        raw.filter(|s| !s.is_empty()).map(str::to_string)
    }

    /// Ideal output time: `ideal_cycle_time × units_produced` (minutes).
    pub fn ideal_output_minutes(&self) -> f64 {
        self.ideal_cycle_time * self.units_produced as f64
    }
}

impl AsRef<ProductionRecord> for ProductionRecord {
    fn as_ref(&self) -> &ProductionRecord {
        self
    }
}

/// Dimension a dataset can be partitioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupField {
    Machine,
    Shift,
    Operator,
    /// Calendar day of the timestamp (`YYYY-MM-DD`)
    Date,
}

impl GroupField {
    /// Column name of the dimension in the canonical CSV schema.
    pub fn column_name(&self) -> &'static str {
        match self {
            GroupField::Machine => "machine_id",
            GroupField::Shift => "shift",
            GroupField::Operator => "operator_id",
            GroupField::Date => "date",
        }
    }
}

impl std::fmt::Display for GroupField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

impl std::str::FromStr for GroupField {
    type Err = crate::error::KpiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "machine" | "machine_id" => Ok(GroupField::Machine),
            "shift" => Ok(GroupField::Shift),
            "operator" | "operator_id" => Ok(GroupField::Operator),
            "date" | "day" | "timestamp" => Ok(GroupField::Date),
            _ => Err(crate::error::KpiError::UnknownGroupField(s.to_string())),
        }
    }
}
