//! KPI engine - filter, group, compute, rank and assemble
//!
//! ```text
//! records ──> filter ──> group ──> KpiCalculator (per group) ──> KpiReport
//!                                                    │
//!                                                    └──> rank / trend
//! ```
//!
//! Every stage is a pure function over borrowed records and an immutable
//! [`AnalysisConfig`](crate::config::AnalysisConfig).

mod assembler;
mod calculator;
mod filter;
mod grouping;
mod ranking;
mod trend;

pub use assembler::{assemble, compute_groups, overview, summary, top_performers};
pub use calculator::{downtime_breakdown, KpiCalculator};
pub use filter::filter;
pub use grouping::{group, GroupedDataset, RecordGroup};
pub use ranking::{rank, rank_by};
pub use trend::trend;

use chrono::NaiveDate;

use crate::config::AnalysisConfig;
use crate::error::KpiError;
use crate::types::{GroupField, KpiReport, ProductionRecord};

/// Parameters of one end-to-end analysis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub group_by: Option<GroupField>,
}

impl AnalysisRequest {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn between(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    #[must_use]
    pub fn group_by(mut self, field: GroupField) -> Self {
        self.group_by = Some(field);
        self
    }
}

/// Filter, group and compute in one call.
///
/// # Errors
///
/// [`KpiError::InvalidRange`] when the request's start is after its end.
pub fn analyze<R>(
    records: &[R],
    request: &AnalysisRequest,
    config: &AnalysisConfig,
) -> Result<KpiReport, KpiError>
where
    R: AsRef<ProductionRecord>,
{
    let filtered = filter(records, request.start, request.end)?;
    let mut report = assemble(&filtered, request.group_by, config);
    report.filter_start = request.start;
    report.filter_end = request.end;
    Ok(report)
}
