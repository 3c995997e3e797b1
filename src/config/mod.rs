//! Analysis Configuration Module
//!
//! Provides the tunables of a KPI run (classification thresholds, shift
//! length, downtime limits, ranking defaults) loaded from TOML files.
//!
//! ## Loading Order
//!
//! 1. `MFG_KPI_CONFIG` environment variable (path to TOML file)
//! 2. `kpi_config.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`])
//!
//! ## Usage
//!
//! The configuration is an immutable value passed to every engine call;
//! there is no global instance.
//!
//! ```ignore
//! let config = AnalysisConfig::load();
//! let report = engine::analyze(&records, &request, &config)?;
//! ```

mod analysis_config;
pub mod defaults;
pub mod validation;

pub use analysis_config::*;
