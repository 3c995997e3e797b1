//! MFG-KPI - Manufacturing KPI analysis from the command line
//!
//! # Usage
//!
//! ```bash
//! # Summary of the sample dataset
//! mfg-kpi --data data/sample_data.csv
//!
//! # OEE per machine for one week
//! mfg-kpi --mode oee --group-by machine --start 2024-03-04 --end 2024-03-10
//!
//! # Top 5 operators by quality, as JSON
//! mfg-kpi --mode top --metric quality --top-n 5 --format json
//!
//! # Daily OEE trend
//! mfg-kpi --mode trend --metric oee
//! ```
//!
//! # Environment Variables
//!
//! - `MFG_KPI_CONFIG`: Path to an analysis config TOML (thresholds, shift length)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;

use mfg_kpi::config::AnalysisConfig;
use mfg_kpi::engine::{self, AnalysisRequest};
use mfg_kpi::report::{self, Focus};
use mfg_kpi::types::{GroupField, ProductionRecord, RankMetric};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "mfg-kpi")]
#[command(about = "Manufacturing KPI analysis: OEE, efficiency, throughput, downtime and quality")]
#[command(version)]
struct CliArgs {
    /// Production data CSV (canonical or legacy layout)
    #[arg(short, long, default_value = "data/sample_data.csv")]
    data: PathBuf,

    /// First day to include (YYYY-MM-DD, inclusive)
    #[arg(long, value_name = "DATE")]
    start: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD, inclusive)
    #[arg(long, value_name = "DATE")]
    end: Option<NaiveDate>,

    /// Dimension to group by: machine, shift, operator or date
    #[arg(short, long)]
    group_by: Option<String>,

    /// Analysis to run
    #[arg(short, long, value_enum, default_value_t = Mode::Summary)]
    mode: Mode,

    /// Metric for top/trend/summary ranking (default from config)
    #[arg(long)]
    metric: Option<String>,

    /// Number of entries in top lists (default from config)
    #[arg(long)]
    top_n: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Analysis config TOML (overrides MFG_KPI_CONFIG)
    #[arg(long, env = "MFG_KPI_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Summary,
    Oee,
    Efficiency,
    Throughput,
    Downtime,
    Quality,
    Top,
    Trend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl Mode {
    fn focus(self) -> Focus {
        match self {
            Mode::Efficiency => Focus::Efficiency,
            Mode::Throughput => Focus::Throughput,
            Mode::Downtime => Focus::Downtime,
            Mode::Quality => Focus::Quality,
            _ => Focus::Oee,
        }
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    let config = match &args.config {
        Some(path) => AnalysisConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnalysisConfig::load(),
    };

    let group_by: Option<GroupField> = args
        .group_by
        .as_deref()
        .map(str::parse::<GroupField>)
        .transpose()
        .context("invalid --group-by")?;
    let metric: RankMetric = match args.metric.as_deref() {
        Some(name) => name.parse().context("invalid --metric")?,
        None => config.default_metric().context("invalid ranking.default_metric")?,
    };
    let top_n = args.top_n.unwrap_or(config.ranking.default_top_n);

    let records = mfg_kpi::load_csv(&args.data, &config)
        .with_context(|| format!("loading production data {}", args.data.display()))?;

    info!(
        records = records.len(),
        mode = ?args.mode,
        group_by = ?group_by,
        metric = %metric,
        "Running analysis"
    );

    let output = run(&args, &records, group_by, metric, top_n, &config)?;
    print!("{output}");
    Ok(())
}

fn run(
    args: &CliArgs,
    records: &[ProductionRecord],
    group_by: Option<GroupField>,
    metric: RankMetric,
    top_n: usize,
    config: &AnalysisConfig,
) -> Result<String> {
    let filtered = engine::filter(records, args.start, args.end)?;
    let json = args.format == Format::Json;

    let output = match args.mode {
        Mode::Summary => {
            let summary = engine::summary(&filtered, metric, top_n, config);
            if json {
                report::render_json(&summary)?
            } else {
                report::render_summary(&summary)
            }
        }
        Mode::Top => {
            let top = engine::top_performers(&filtered, metric, top_n, config);
            if json {
                report::render_json(&top)?
            } else {
                report::render_top(&top)
            }
        }
        Mode::Trend => {
            let field = group_by.unwrap_or(GroupField::Date);
            match engine::trend(&filtered, metric, field, config) {
                Some(t) if json => report::render_json(&t)?,
                Some(t) => report::render_trend(&t),
                None if json => "null\n".to_string(),
                None => "No data in range\n".to_string(),
            }
        }
        mode => {
            let request = AnalysisRequest::new().between(args.start, args.end);
            let request = match group_by {
                Some(field) => request.group_by(field),
                None => request,
            };
            let kpis = engine::analyze(records, &request, config)?;
            if json {
                report::render_json(&kpis)?
            } else {
                report::render_focus(&kpis, mode.focus())
            }
        }
    };
    if json && !output.ends_with('\n') {
        Ok(output + "\n")
    } else {
        Ok(output)
    }
}
