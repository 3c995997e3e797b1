//! KPI calculator: OEE and companion metrics for one group of records
//!
//! ## Definitions (aggregate-then-ratio)
//!
//! Every ratio divides group totals, never averages per-record ratios, so
//! low-volume records carry no extra weight:
//!
//! - Availability = Σ runtime / Σ planned time            (0 if nothing planned)
//! - Performance  = Σ(ideal cycle × produced) / Σ runtime (0 if nothing ran, capped at 1)
//! - Quality      = Σ good / Σ produced                   (1 if nothing produced)
//! - OEE          = Availability × Performance × Quality
//! - Efficiency   = Σ produced / Σ target                 (unbounded above)
//! - Throughput   = Σ produced / Σ runtime                (units per minute)
//! - Downtime rate = Σ downtime / Σ planned time
//!
//! Minute sums are order-independent (see `ordered_sum`), so shuffling the
//! input rows yields bit-identical results.
//!
//! ## Classification (default thresholds)
//!
//! | OEE | Class |
//! |-----|-------|
//! | >= 0.85 | world_class |
//! | >= 0.65 | good |
//! | >= 0.40 | average |
//! | < 0.40 | poor |

use statrs::statistics::Statistics;
use std::collections::HashMap;
use tracing::trace;

use crate::config::AnalysisConfig;
use crate::types::{
    ordered_sum, DateRange, DowntimeReasonEntry, DowntimeStats, KpiResult, KpiTotals,
    PerformanceClass, ProductionRecord, QualityStats, ThroughputStats,
};

/// Stateless KPI calculator bound to one immutable configuration.
///
/// Safe to share across threads; each call only reads its own records.
#[derive(Debug, Clone, Copy)]
pub struct KpiCalculator<'c> {
    config: &'c AnalysisConfig,
}

impl<'c> KpiCalculator<'c> {
    pub fn new(config: &'c AnalysisConfig) -> Self {
        Self { config }
    }

    /// Compute every KPI for `records` under `group_key`.
    ///
    /// An empty slice yields zero availability/performance/OEE, quality 1.0
    /// and no downtime entries.
    pub fn compute(&self, group_key: &str, records: &[&ProductionRecord]) -> KpiResult {
        let totals = KpiTotals::from_records(records.iter().copied());
        let result = self.build(
            group_key,
            totals,
            DateRange::covering(records.iter().copied()),
            downtime_breakdown(records),
            self.downtime_stats(records),
            quality_stats(records, &totals),
        );
        trace!(
            group = group_key,
            records = result.record_count,
            oee = result.oee,
            "Group KPIs computed"
        );
        result
    }

    /// Derive a result from already-summed totals.
    ///
    /// Used for the overall row so it can be checked against merged
    /// per-group totals.
    pub fn build(
        &self,
        group_key: &str,
        totals: KpiTotals,
        date_range: Option<DateRange>,
        downtime_breakdown: Vec<DowntimeReasonEntry>,
        downtime: DowntimeStats,
        quality_stats: QualityStats,
    ) -> KpiResult {
        let availability = totals.availability();
        let performance = totals.performance();
        let quality = totals.quality();
        let oee = availability * performance * quality;

        KpiResult {
            group_key: group_key.to_string(),
            record_count: totals.record_count,
            date_range,
            availability,
            performance,
            quality,
            oee,
            efficiency: totals.efficiency(),
            quality_rate: quality,
            throughput_rate: totals.throughput_rate(),
            total_downtime_minutes: totals.downtime_minutes,
            downtime_rate: totals.downtime_rate(),
            classification: PerformanceClass::from_oee(oee, &self.config.thresholds),
            totals,
            downtime_breakdown,
            downtime,
            throughput: ThroughputStats::from_totals(&totals),
            quality_stats,
        }
    }

    fn downtime_stats(&self, records: &[&ProductionRecord]) -> DowntimeStats {
        if records.is_empty() {
            return DowntimeStats::default();
        }
        let limit = self.config.downtime.high_downtime_minutes;
        let minutes: Vec<f64> = records.iter().map(|r| r.downtime_minutes).collect();
        DowntimeStats {
            mean_minutes: ordered_sum(minutes.iter().copied()) / minutes.len() as f64,
            max_minutes: minutes.iter().copied().fold(0.0, f64::max),
            high_downtime_records: minutes.iter().filter(|&&m| m > limit).count(),
            zero_downtime_records: minutes.iter().filter(|&&m| m == 0.0).count(),
        }
    }
}

/// Downtime per stated reason, largest first; ties by reason name.
pub fn downtime_breakdown(records: &[&ProductionRecord]) -> Vec<DowntimeReasonEntry> {
    let mut by_reason: HashMap<&str, Vec<f64>> = HashMap::new();
    for r in records {
        let Some(reason) = r.downtime_reason.as_deref().filter(|s| !s.is_empty()) else {
            continue;
        };
        by_reason.entry(reason).or_default().push(r.downtime_minutes);
    }

    let mut entries: Vec<DowntimeReasonEntry> = by_reason
        .into_iter()
        .map(|(reason, minutes)| DowntimeReasonEntry {
            reason: reason.to_string(),
            occurrences: minutes.len(),
            total_minutes: ordered_sum(minutes),
        })
        .collect();
    entries.sort_by(|a, b| {
        b.total_minutes
            .total_cmp(&a.total_minutes)
            .then_with(|| a.reason.cmp(&b.reason))
    });
    entries
}

fn quality_stats(records: &[&ProductionRecord], totals: &KpiTotals) -> QualityStats {
    let mut per_record: Vec<f64> = records
        .iter()
        .filter(|r| r.units_produced > 0)
        .map(|r| (r.good_units as f64 / r.units_produced as f64).clamp(0.0, 1.0))
        .collect();
    per_record.sort_by(f64::total_cmp);

    let best = per_record.iter().copied().reduce(f64::max);
    let worst = per_record.iter().copied().reduce(f64::min);
    let std_dev = (per_record.len() >= 2)
        .then(|| per_record.iter().std_dev())
        .filter(|s| s.is_finite());

    QualityStats {
        total_defects: totals.defective_units,
        defect_rate: totals.defect_rate(),
        best_record_quality: best,
        worst_record_quality: worst,
        quality_std_dev: std_dev,
    }
}
