//! Sample Manufacturing Data Generator
//!
//! Writes a reproducible CSV of per-shift production records in the
//! canonical layout read by `mfg-kpi`. Simulates:
//! - Six machines with different target rates and reliability
//! - Three shifts with a performance dip on afternoons and nights
//! - Random operator assignment, downtime events and defect rates
//!
//! # Usage
//! ```bash
//! generate-sample-data --days 30 --seed 1 --output data/sample_data.csv
//! ```

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use clap::Parser;
use rand::prelude::*;
use rand_distr::{Distribution, Normal, Uniform};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use mfg_kpi::types::ProductionRecord;

// ============================================================================
// Plant Constants
// ============================================================================

/// Shift length (minutes)
const SHIFT_MINUTES: f64 = 480.0;
/// Shift length (hours)
const SHIFT_HOURS: u64 = 8;
/// Efficiency bounds after random variation
const MIN_EFFICIENCY: f64 = 0.3;
const MAX_EFFICIENCY: f64 = 1.2;

struct MachineProfile {
    id: &'static str,
    /// Units per hour at nominal speed
    target_rate: u64,
    reliability: f64,
}

const MACHINES: [MachineProfile; 6] = [
    MachineProfile {
        id: "A1",
        target_rate: 100,
        reliability: 0.95,
    },
    MachineProfile {
        id: "A2",
        target_rate: 100,
        reliability: 0.88,
    },
    MachineProfile {
        id: "B1",
        target_rate: 85,
        reliability: 0.92,
    },
    MachineProfile {
        id: "B2",
        target_rate: 85,
        reliability: 0.85,
    },
    MachineProfile {
        id: "C1",
        target_rate: 120,
        reliability: 0.93,
    },
    MachineProfile {
        id: "C2",
        target_rate: 120,
        reliability: 0.90,
    },
];

const OPERATORS: [&str; 6] = ["OP001", "OP002", "OP003", "OP004", "OP005", "OP006"];

/// (name, start hour, performance factor)
const SHIFTS: [(&str, u32, f64); 3] = [
    ("Morning", 6, 1.0),
    ("Afternoon", 14, 0.95),
    ("Night", 22, 0.85),
];

const DOWNTIME_REASONS: [&str; 5] = [
    "Mechanical Failure",
    "Material Shortage",
    "Changeover",
    "Quality Hold",
    "Planned Maintenance",
];

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "generate-sample-data")]
#[command(about = "Generate sample manufacturing production data for mfg-kpi")]
#[command(version)]
struct Args {
    /// Number of calendar days to simulate
    #[arg(short, long, default_value = "30")]
    days: u32,

    /// Random seed for reproducibility
    #[arg(long, default_value = "1")]
    seed: u64,

    /// First simulated day (default: today minus --days)
    #[arg(long, value_name = "DATE")]
    start: Option<NaiveDate>,

    /// Output CSV path
    #[arg(short, long, default_value = "data/sample_data.csv")]
    output: PathBuf,

    /// Also simulate Saturdays and Sundays
    #[arg(long)]
    include_weekends: bool,
}

// ============================================================================
// Generation
// ============================================================================

struct Generator {
    rng: StdRng,
    efficiency_noise: Normal<f64>,
    downtime_noise: Normal<f64>,
    defect_rate: Uniform<f64>,
}

impl Generator {
    fn new(seed: u64) -> Result<Self> {
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            efficiency_noise: Normal::new(1.0, 0.1).context("efficiency distribution")?,
            downtime_noise: Normal::new(0.0, 20.0).context("downtime distribution")?,
            defect_rate: Uniform::new(0.01, 0.05),
        })
    }

    fn shift_record(
        &mut self,
        day: NaiveDate,
        (shift, hour, factor): (&str, u32, f64),
        machine: &MachineProfile,
    ) -> Option<ProductionRecord> {
        let timestamp = day.and_hms_opt(hour, 0, 0)?;
        let operator = OPERATORS.choose(&mut self.rng)?;

        let target = machine.target_rate * SHIFT_HOURS;
        let efficiency = (machine.reliability * factor * self.efficiency_noise.sample(&mut self.rng))
            .clamp(MIN_EFFICIENCY, MAX_EFFICIENCY);
        let produced = (target as f64 * efficiency).floor() as u64;

        let base_downtime = (1.0 - machine.reliability) * SHIFT_MINUTES;
        let downtime = (base_downtime + self.downtime_noise.sample(&mut self.rng))
            .floor()
            .clamp(0.0, SHIFT_MINUTES);

        let defective = (produced as f64 * self.defect_rate.sample(&mut self.rng)).floor() as u64;

        let downtime_reason = if downtime > 0.0 {
            DOWNTIME_REASONS.choose(&mut self.rng).map(|r| (*r).to_string())
        } else {
            None
        };

        Some(ProductionRecord {
            timestamp,
            machine_id: Some(machine.id.to_string()),
            shift: Some(shift.to_string()),
            operator_id: Some((*operator).to_string()),
            planned_production_time: SHIFT_MINUTES,
            actual_runtime: SHIFT_MINUTES - downtime,
            ideal_cycle_time: SHIFT_MINUTES / target as f64,
            units_produced: produced,
            units_target: target,
            good_units: produced - defective,
            defective_units: defective,
            downtime_minutes: downtime,
            downtime_reason,
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let start = args
        .start
        .unwrap_or_else(|| Local::now().date_naive() - Duration::days(i64::from(args.days)));

    let mut generator = Generator::new(args.seed)?;
    let mut records = Vec::new();

    for offset in 0..args.days {
        let day = start + Duration::days(i64::from(offset));
        if !args.include_weekends && matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }
        for shift in SHIFTS {
            for machine in &MACHINES {
                if let Some(record) = generator.shift_record(day, shift, machine) {
                    records.push(record);
                }
            }
        }
    }

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("opening {}", args.output.display()))?;
    for record in &records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    let produced: u64 = records.iter().map(|r| r.units_produced).sum();
    let target: u64 = records.iter().map(|r| r.units_target).sum();
    let downtime: f64 = records.iter().map(|r| r.downtime_minutes).sum();
    info!(
        records = records.len(),
        start = %start,
        days = args.days,
        seed = args.seed,
        produced,
        target,
        downtime_minutes = downtime,
        output = %args.output.display(),
        "Sample data written"
    );
    Ok(())
}
