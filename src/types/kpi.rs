//! KPI value types: summed totals, per-group results and classifications

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::ProductionRecord;
use crate::error::KpiError;

/// Group key used when a dataset is not partitioned.
pub const ALL_GROUP: &str = "all";

/// Group key for records missing the requested dimension.
pub const UNKNOWN_GROUP: &str = "unknown";

// ============================================================================
// Zero-safe ratios
// ============================================================================

/// `num / den`, or `when_zero` if the denominator is zero or the quotient is
/// not finite. Never yields NaN.
pub(crate) fn ratio(num: f64, den: f64, when_zero: f64) -> f64 {
    if den <= 0.0 || !den.is_finite() {
        return when_zero;
    }
    let r = num / den;
    if r.is_finite() {
        r
    } else {
        when_zero
    }
}

/// Ratio clamped to the closed unit interval.
pub(crate) fn unit_ratio(num: f64, den: f64, when_zero: f64) -> f64 {
    ratio(num, den, when_zero).clamp(0.0, 1.0)
}

/// Sum of `values` that does not depend on their input order.
///
/// Terms are added in ascending `total_cmp` order, so any permutation of the
/// same values yields a bit-identical total.
pub(crate) fn ordered_sum<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut terms: Vec<f64> = values.into_iter().collect();
    terms.sort_by(f64::total_cmp);
    terms.iter().sum()
}

// ============================================================================
// Totals
// ============================================================================

/// Summed numerators and denominators behind every group ratio.
///
/// Ratios are always derived from totals (aggregate-then-ratio), so merging
/// the totals of any partition reproduces the totals of the whole dataset
/// (minute sums up to rounding).
/// Unit counters saturate at `u64::MAX` instead of overflowing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiTotals {
    pub record_count: usize,
    pub planned_minutes: f64,
    pub runtime_minutes: f64,
    /// Σ ideal_cycle_time × units_produced
    pub ideal_output_minutes: f64,
    pub units_produced: u64,
    pub units_target: u64,
    pub good_units: u64,
    pub defective_units: u64,
    pub downtime_minutes: f64,
    /// Largest `units_produced` of any single record
    pub peak_units_produced: u64,
}

impl KpiTotals {
    /// Totals over `records`, bit-identical for any ordering of them.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ProductionRecord>,
    {
        let records: Vec<&ProductionRecord> = records.into_iter().collect();
        let counts = records.iter().fold(Self::default(), |acc, r| Self {
            record_count: acc.record_count.saturating_add(1),
            units_produced: acc.units_produced.saturating_add(r.units_produced),
            units_target: acc.units_target.saturating_add(r.units_target),
            good_units: acc.good_units.saturating_add(r.good_units),
            defective_units: acc.defective_units.saturating_add(r.defective_units),
            peak_units_produced: acc.peak_units_produced.max(r.units_produced),
            ..acc
        });

        Self {
            planned_minutes: ordered_sum(records.iter().map(|r| r.planned_production_time)),
            runtime_minutes: ordered_sum(records.iter().map(|r| r.actual_runtime)),
            ideal_output_minutes: ordered_sum(records.iter().map(|r| r.ideal_output_minutes())),
            downtime_minutes: ordered_sum(records.iter().map(|r| r.downtime_minutes)),
            ..counts
        }
    }

    /// Combine the totals of two disjoint record sets.
    ///
    /// Commutative, but the minute sums of a multi-way merge depend on the
    /// merge order in their last bits; `from_records` over the union does not.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            record_count: self.record_count.saturating_add(other.record_count),
            planned_minutes: self.planned_minutes + other.planned_minutes,
            runtime_minutes: self.runtime_minutes + other.runtime_minutes,
            ideal_output_minutes: self.ideal_output_minutes + other.ideal_output_minutes,
            units_produced: self.units_produced.saturating_add(other.units_produced),
            units_target: self.units_target.saturating_add(other.units_target),
            good_units: self.good_units.saturating_add(other.good_units),
            defective_units: self.defective_units.saturating_add(other.defective_units),
            downtime_minutes: self.downtime_minutes + other.downtime_minutes,
            peak_units_produced: self.peak_units_produced.max(other.peak_units_produced),
        }
    }

    /// Runtime / planned time; 0 when nothing was planned.
    pub fn availability(&self) -> f64 {
        unit_ratio(self.runtime_minutes, self.planned_minutes, 0.0)
    }

    /// Ideal output time / runtime, capped at 1.0; 0 when nothing ran.
    pub fn performance(&self) -> f64 {
        unit_ratio(self.ideal_output_minutes, self.runtime_minutes, 0.0)
    }

    /// Good / produced; 1.0 when nothing was produced (no quality loss).
    pub fn quality(&self) -> f64 {
        unit_ratio(self.good_units as f64, self.units_produced as f64, 1.0)
    }

    pub fn oee(&self) -> f64 {
        self.availability() * self.performance() * self.quality()
    }

    /// Produced / target; unbounded above.
    pub fn efficiency(&self) -> f64 {
        ratio(self.units_produced as f64, self.units_target as f64, 0.0).max(0.0)
    }

    /// Units per runtime minute.
    pub fn throughput_rate(&self) -> f64 {
        ratio(self.units_produced as f64, self.runtime_minutes, 0.0).max(0.0)
    }

    pub fn downtime_rate(&self) -> f64 {
        unit_ratio(self.downtime_minutes, self.planned_minutes, 0.0)
    }

    /// Defective / produced; 0 when nothing was produced.
    pub fn defect_rate(&self) -> f64 {
        unit_ratio(self.defective_units as f64, self.units_produced as f64, 0.0)
    }
}

// ============================================================================
// Classification
// ============================================================================

/// OEE cut-offs for the qualitative performance label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OeeThresholds {
    /// OEE at or above this is world class
    #[serde(default = "default_world_class")]
    pub world_class: f64,
    /// OEE at or above this is good
    #[serde(default = "default_good")]
    pub good: f64,
    /// OEE at or above this is average; below is poor
    #[serde(default = "default_average")]
    pub average: f64,
}

fn default_world_class() -> f64 {
    crate::config::defaults::OEE_WORLD_CLASS
}

fn default_good() -> f64 {
    crate::config::defaults::OEE_GOOD
}

fn default_average() -> f64 {
    crate::config::defaults::OEE_AVERAGE
}

impl Default for OeeThresholds {
    fn default() -> Self {
        Self {
            world_class: default_world_class(),
            good: default_good(),
            average: default_average(),
        }
    }
}

/// Qualitative OEE band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceClass {
    WorldClass,
    Good,
    Average,
    Poor,
}

impl PerformanceClass {
    pub fn from_oee(oee: f64, thresholds: &OeeThresholds) -> Self {
        if oee >= thresholds.world_class {
            PerformanceClass::WorldClass
        } else if oee >= thresholds.good {
            PerformanceClass::Good
        } else if oee >= thresholds.average {
            PerformanceClass::Average
        } else {
            PerformanceClass::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceClass::WorldClass => "world_class",
            PerformanceClass::Good => "good",
            PerformanceClass::Average => "average",
            PerformanceClass::Poor => "poor",
        }
    }
}

impl std::fmt::Display for PerformanceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Result components
// ============================================================================

/// Inclusive span of timestamps covered by a set of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    /// Smallest range containing every record, `None` for an empty set.
    pub fn covering<'a, I>(records: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a ProductionRecord>,
    {
        records.into_iter().fold(None, |acc, r| match acc {
            None => Some(Self {
                start: r.timestamp,
                end: r.timestamp,
            }),
            Some(range) => Some(Self {
                start: range.start.min(r.timestamp),
                end: range.end.max(r.timestamp),
            }),
        })
    }

    /// Calendar days spanned, counting both ends.
    pub fn days(&self) -> i64 {
        (self.end.date() - self.start.date()).num_days() + 1
    }
}

/// Downtime attributed to one stated cause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DowntimeReasonEntry {
    pub reason: String,
    pub total_minutes: f64,
    pub occurrences: usize,
}

/// Per-record downtime distribution within a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DowntimeStats {
    pub mean_minutes: f64,
    pub max_minutes: f64,
    /// Records whose downtime exceeded the configured high-downtime limit
    pub high_downtime_records: usize,
    pub zero_downtime_records: usize,
}

/// Per-shift output within a group; each record is one shift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThroughputStats {
    /// Σ produced / record count; 0 for an empty group
    pub avg_units_per_shift: f64,
    /// Highest `units_produced` of a single record
    pub peak_shift_units: u64,
}

impl ThroughputStats {
    pub fn from_totals(totals: &KpiTotals) -> Self {
        Self {
            avg_units_per_shift: ratio(
                totals.units_produced as f64,
                totals.record_count as f64,
                0.0,
            ),
            peak_shift_units: totals.peak_units_produced,
        }
    }
}

/// Per-record quality distribution within a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityStats {
    pub total_defects: u64,
    pub defect_rate: f64,
    /// Highest per-record good/produced, over records with output
    pub best_record_quality: Option<f64>,
    pub worst_record_quality: Option<f64>,
    /// Sample standard deviation of per-record quality (needs 2+ records)
    pub quality_std_dev: Option<f64>,
}

// ============================================================================
// KpiResult
// ============================================================================

/// KPIs for one group of records.
///
/// All ratios are stored as raw fractions (0.875, not 87.5). Built in one
/// step by the calculator and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiResult {
    pub group_key: String,
    pub record_count: usize,
    pub date_range: Option<DateRange>,
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
    pub oee: f64,
    pub efficiency: f64,
    pub quality_rate: f64,
    /// Units per runtime minute
    pub throughput_rate: f64,
    pub total_downtime_minutes: f64,
    pub downtime_rate: f64,
    pub classification: PerformanceClass,
    pub totals: KpiTotals,
    /// Sorted by total minutes descending, then reason ascending
    pub downtime_breakdown: Vec<DowntimeReasonEntry>,
    pub downtime: DowntimeStats,
    pub throughput: ThroughputStats,
    pub quality_stats: QualityStats,
}

impl KpiResult {
    pub fn metric(&self, metric: RankMetric) -> f64 {
        match metric {
            RankMetric::Oee => self.oee,
            RankMetric::Availability => self.availability,
            RankMetric::Performance => self.performance,
            RankMetric::Quality => self.quality,
            RankMetric::Efficiency => self.efficiency,
            RankMetric::QualityRate => self.quality_rate,
            RankMetric::ThroughputRate => self.throughput_rate,
            RankMetric::TotalDowntimeMinutes => self.total_downtime_minutes,
            RankMetric::DowntimeRate => self.downtime_rate,
            RankMetric::RecordCount => self.record_count as f64,
        }
    }

    pub fn throughput_per_hour(&self) -> f64 {
        self.throughput_rate * 60.0
    }
}

/// Numeric `KpiResult` field usable for ranking and trends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    Oee,
    Availability,
    Performance,
    Quality,
    Efficiency,
    QualityRate,
    ThroughputRate,
    TotalDowntimeMinutes,
    DowntimeRate,
    RecordCount,
}

impl RankMetric {
    pub const ALL: [RankMetric; 10] = [
        RankMetric::Oee,
        RankMetric::Availability,
        RankMetric::Performance,
        RankMetric::Quality,
        RankMetric::Efficiency,
        RankMetric::QualityRate,
        RankMetric::ThroughputRate,
        RankMetric::TotalDowntimeMinutes,
        RankMetric::DowntimeRate,
        RankMetric::RecordCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RankMetric::Oee => "oee",
            RankMetric::Availability => "availability",
            RankMetric::Performance => "performance",
            RankMetric::Quality => "quality",
            RankMetric::Efficiency => "efficiency",
            RankMetric::QualityRate => "quality_rate",
            RankMetric::ThroughputRate => "throughput_rate",
            RankMetric::TotalDowntimeMinutes => "total_downtime_minutes",
            RankMetric::DowntimeRate => "downtime_rate",
            RankMetric::RecordCount => "record_count",
        }
    }
}

impl std::fmt::Display for RankMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RankMetric {
    type Err = KpiError;

    /// Accepts snake_case, CamelCase or upper-case spellings ("OEE",
    /// "quality_rate", "QualityRate").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        RankMetric::ALL
            .into_iter()
            .find(|m| m.as_str().replace('_', "") == normalized)
            .ok_or_else(|| KpiError::UnknownMetric(s.to_string()))
    }
}
