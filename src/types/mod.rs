//! Shared data structures for manufacturing KPI analysis
//!
//! - `ProductionRecord`: one validated observation (loader output, engine input)
//! - `KpiTotals` / `KpiResult`: per-group sums and derived KPIs
//! - `KpiReport`, `SummaryReport`, `TrendAnalysis`: assembled outputs

mod record;
mod kpi;
mod report;

pub use record::*;
pub use kpi::*;
pub use report::*;

#[cfg(test)]
pub(crate) use record::fixtures;
