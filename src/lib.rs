//! MFG-KPI: Manufacturing KPI Analysis
//!
//! Computes Overall Equipment Effectiveness (OEE) and companion metrics from
//! time-stamped production records.
//!
//! ## Architecture
//!
//! - **Loader**: CSV ingestion and validation (canonical and legacy layouts)
//! - **Engine**: date filter, grouping, KPI calculator, ranking, trends
//! - **Report**: plain-text and JSON rendering
//! - **Config**: thresholds and tunables from TOML, passed explicitly

pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod report;
pub mod types;

// Re-export configuration
pub use config::{AnalysisConfig, ConfigError};

// Re-export errors
pub use error::{KpiError, LoadError};

// Re-export commonly used types
pub use types::{
    DataOverview, DateRange, DowntimeReasonEntry, GroupField, KpiReport, KpiResult, KpiTotals,
    OeeThresholds, PerformanceClass, ProductionRecord, RankMetric, SummaryReport, TopPerformers,
    TrendAnalysis, TrendDirection,
};

// Re-export engine entry points
pub use engine::{
    analyze, assemble, filter, group, rank, trend, AnalysisRequest, GroupedDataset, KpiCalculator,
};

// Re-export loader
pub use loader::{load_csv, read_records};
