//! Analysis Configuration - KPI tunables as operator-editable TOML values
//!
//! Each struct implements `Default` with the values in [`super::defaults`],
//! so a run without a config file behaves exactly like the built-in
//! classification scheme.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use crate::types::{OeeThresholds, RankMetric};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a KPI analysis run.
///
/// Load with `AnalysisConfig::load()` which searches:
/// 1. `$MFG_KPI_CONFIG` env var
/// 2. `./kpi_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// OEE classification cut-offs
    #[serde(default)]
    pub thresholds: OeeThresholds,

    /// Shift calendar
    #[serde(default)]
    pub shift: ShiftConfig,

    /// Downtime statistics
    #[serde(default)]
    pub downtime: DowntimeConfig,

    /// Top-performer defaults
    #[serde(default)]
    pub ranking: RankingConfig,

    /// Per-group parallel evaluation
    #[serde(default)]
    pub parallel: ParallelConfig,
}

impl AnalysisConfig {
    /// Load configuration using the standard search order:
    /// 1. `$MFG_KPI_CONFIG` environment variable
    /// 2. `./kpi_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded analysis config from {}", defaults::CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", defaults::CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./kpi_config.toml
        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded analysis config from ./{}", defaults::LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", defaults::LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate TOML text. Unknown keys only produce warnings.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Write the configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Saved analysis config");
        Ok(())
    }

    /// Default ranking metric, parsed.
    pub fn default_metric(&self) -> Result<RankMetric, ConfigError> {
        self.ranking
            .default_metric
            .parse()
            .map_err(|e: crate::error::KpiError| ConfigError::Validation(vec![e.to_string()]))
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - Thresholds must satisfy 0 <= average < good < world_class <= 1
    /// - Shift length must be positive
    /// - The default ranking metric must name a KPI field
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        let mut errors: Vec<String> = Vec::new();

        for (name, value) in [
            ("thresholds.world_class", t.world_class),
            ("thresholds.good", t.good),
            ("thresholds.average", t.average),
            ("shift.shift_minutes", self.shift.shift_minutes),
            ("downtime.high_downtime_minutes", self.downtime.high_downtime_minutes),
        ] {
            if !value.is_finite() {
                errors.push(format!("{name}: value must be finite (got {value})"));
            }
        }

        Self::check_ascending(t.average, t.good, "thresholds.average", "thresholds.good", &mut errors);
        Self::check_ascending(t.good, t.world_class, "thresholds.good", "thresholds.world_class", &mut errors);
        if t.average < 0.0 {
            errors.push(format!("thresholds.average ({:.2}) must be >= 0", t.average));
        }
        if t.world_class > 1.0 {
            errors.push(format!("thresholds.world_class ({:.2}) must be <= 1", t.world_class));
        }

        if self.shift.shift_minutes <= 0.0 {
            errors.push("shift.shift_minutes must be > 0".to_string());
        }
        if self.downtime.high_downtime_minutes < 0.0 {
            errors.push("downtime.high_downtime_minutes must be >= 0".to_string());
        }
        if self.ranking.default_top_n == 0 {
            errors.push("ranking.default_top_n must be > 0".to_string());
        }
        if self.ranking.default_metric.parse::<RankMetric>().is_err() {
            errors.push(format!(
                "ranking.default_metric '{}' is not a KPI field",
                self.ranking.default_metric
            ));
        }

        let (range_errors, range_warnings) = super::validation::validate_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_ascending(lower: f64, upper: f64, lower_name: &str, upper_name: &str, errors: &mut Vec<String>) {
        // NaN comparisons pass here; the finiteness sweep reports them
        if lower >= upper {
            errors.push(format!(
                "{lower_name} ({lower:.3}) must be less than {upper_name} ({upper:.3})"
            ));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Shift Config
// ============================================================================

/// Shift calendar used when records do not carry planned time themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftConfig {
    /// Planned minutes per shift record (legacy CSV import).
    #[serde(default = "default_shift_minutes")]
    pub shift_minutes: f64,
}

fn default_shift_minutes() -> f64 {
    defaults::SHIFT_MINUTES
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            shift_minutes: default_shift_minutes(),
        }
    }
}

// ============================================================================
// Downtime Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DowntimeConfig {
    /// Records with more downtime than this (minutes) count as high downtime.
    #[serde(default = "default_high_downtime")]
    pub high_downtime_minutes: f64,
}

fn default_high_downtime() -> f64 {
    defaults::HIGH_DOWNTIME_MINUTES
}

impl Default for DowntimeConfig {
    fn default() -> Self {
        Self {
            high_downtime_minutes: default_high_downtime(),
        }
    }
}

// ============================================================================
// Ranking Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Metric used for top-performer lists when none is given.
    #[serde(default = "default_rank_metric")]
    pub default_metric: String,

    /// Entries per top-performer list.
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,
}

fn default_rank_metric() -> String {
    defaults::DEFAULT_RANK_METRIC.to_string()
}

fn default_top_n() -> usize {
    defaults::DEFAULT_TOP_N
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            default_metric: default_rank_metric(),
            default_top_n: default_top_n(),
        }
    }
}

// ============================================================================
// Parallel Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// Minimum group count before per-group KPIs run on the rayon pool.
    #[serde(default = "default_parallel_min_groups")]
    pub min_groups: usize,
}

fn default_parallel_min_groups() -> usize {
    defaults::PARALLEL_MIN_GROUPS
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            min_groups: default_parallel_min_groups(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
