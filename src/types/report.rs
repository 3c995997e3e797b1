//! Assembled report structures handed to rendering collaborators

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DateRange, GroupField, KpiResult, RankMetric};

/// Overall and per-group KPIs for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiReport {
    /// Dimension the groups were built on; `None` means a single "all" group
    pub group_field: Option<GroupField>,
    /// Requested filter bounds (inclusive)
    pub filter_start: Option<NaiveDate>,
    pub filter_end: Option<NaiveDate>,
    /// KPIs over the entire filtered dataset
    pub overall: KpiResult,
    /// Per-group KPIs in first-occurrence order
    pub groups: Vec<KpiResult>,
}

/// Record count for one shift name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftCount {
    pub shift: String,
    pub records: usize,
}

/// Shape of the filtered dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataOverview {
    pub total_records: usize,
    pub date_range: Option<DateRange>,
    /// Calendar days spanned (0 when empty)
    pub analysis_days: i64,
    /// Distinct machine ids, sorted
    pub machines: Vec<String>,
    /// Distinct operator ids, sorted
    pub operators: Vec<String>,
    /// Records per shift, sorted by shift name
    pub shifts: Vec<ShiftCount>,
}

/// Best machines and operators by one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPerformers {
    pub metric: RankMetric,
    pub top_machines: Vec<KpiResult>,
    pub top_operators: Vec<KpiResult>,
    pub total_machines: usize,
    pub total_operators: usize,
}

/// Everything the summary view shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub overview: DataOverview,
    pub overall: KpiResult,
    pub top_performers: TopPerformers,
}

/// One point of a metric series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TrendDirection::Improving => "improving",
            TrendDirection::Declining => "declining",
            TrendDirection::Stable => "stable",
        };
        write!(f, "{s}")
    }
}

/// Metric series over periods plus its summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub metric: RankMetric,
    pub group_field: GroupField,
    pub points: Vec<TrendPoint>,
    pub direction: TrendDirection,
    pub best_period: String,
    pub worst_period: String,
    pub average: f64,
    /// Sample standard deviation of the series (0 with fewer than 2 points)
    pub volatility: f64,
}
