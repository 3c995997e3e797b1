//! System-wide default constants.
//!
//! Centralises the numbers the analysis falls back to when no config file
//! overrides them. Grouped by subsystem for easy discovery.

// ============================================================================
// OEE Classification
// ============================================================================

/// OEE at or above this is world class.
pub const OEE_WORLD_CLASS: f64 = 0.85;

/// OEE at or above this is good.
pub const OEE_GOOD: f64 = 0.65;

/// OEE at or above this is average; anything lower is poor.
pub const OEE_AVERAGE: f64 = 0.40;

// ============================================================================
// Shifts
// ============================================================================

/// Planned minutes in one shift (8 hours).
///
/// Used as the planned production time of every legacy-format record.
pub const SHIFT_MINUTES: f64 = 480.0;

// ============================================================================
// Downtime
// ============================================================================

/// A record with more downtime than this (minutes) counts as high downtime.
pub const HIGH_DOWNTIME_MINUTES: f64 = 60.0;

// ============================================================================
// Ranking
// ============================================================================

/// Metric used by the top-performer view when none is requested.
pub const DEFAULT_RANK_METRIC: &str = "oee";

/// Entries shown per top-performer list.
pub const DEFAULT_TOP_N: usize = 3;

// ============================================================================
// Parallelism
// ============================================================================

/// Group count at which per-group KPIs are computed on the rayon pool.
pub const PARALLEL_MIN_GROUPS: usize = 8;

// ============================================================================
// Config discovery
// ============================================================================

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "MFG_KPI_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "kpi_config.toml";
