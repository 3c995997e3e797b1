//! Trend analysis: one metric tracked across periods

use statrs::statistics::Statistics;
use tracing::debug;

use super::assembler::compute_groups;
use super::grouping::group;
use crate::config::AnalysisConfig;
use crate::types::{
    GroupField, ProductionRecord, RankMetric, TrendAnalysis, TrendDirection, TrendPoint,
};

/// Last-vs-first differences smaller than this count as stable.
const STABLE_TOLERANCE: f64 = 1e-9;

/// Series of `metric` per period of `period_field`.
///
/// Each point is the group KPI (aggregate-then-ratio), not a mean of
/// per-record values. Date periods are chronological; other dimensions keep
/// first-occurrence order. Returns `None` when there are no records.
pub fn trend(
    records: &[&ProductionRecord],
    metric: RankMetric,
    period_field: GroupField,
    config: &AnalysisConfig,
) -> Option<TrendAnalysis> {
    if records.is_empty() {
        return None;
    }

    let mut results = compute_groups(&group(records, Some(period_field)), config);
    if period_field == GroupField::Date {
        results.sort_by(|a, b| a.group_key.cmp(&b.group_key));
    }

    let points: Vec<TrendPoint> = results
        .iter()
        .map(|r| TrendPoint {
            period: r.group_key.clone(),
            value: r.metric(metric),
        })
        .collect();
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();

    let first = *values.first()?;
    let last = *values.last()?;
    let direction = if (last - first).abs() <= STABLE_TOLERANCE {
        TrendDirection::Stable
    } else if last > first {
        TrendDirection::Improving
    } else {
        TrendDirection::Declining
    };

    // First period wins ties
    let best = points
        .iter()
        .reduce(|best, p| if p.value > best.value { p } else { best })?;
    let worst = points
        .iter()
        .reduce(|worst, p| if p.value < worst.value { p } else { worst })?;

    let average = values.iter().sum::<f64>() / values.len() as f64;
    let volatility = if values.len() < 2 {
        0.0
    } else {
        let sd = values.iter().std_dev();
        if sd.is_finite() { sd } else { 0.0 }
    };

    debug!(
        metric = %metric,
        field = %period_field,
        periods = points.len(),
        direction = %direction,
        "Trend computed"
    );

    Some(TrendAnalysis {
        metric,
        group_field: period_field,
        best_period: best.period.clone(),
        worst_period: worst.period.clone(),
        points,
        direction,
        average,
        volatility,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::record;

    /// One record per day with the given good-unit counts (quality varies).
    fn days(goods: &[u64]) -> Vec<ProductionRecord> {
        goods
            .iter()
            .enumerate()
            .map(|(i, &good)| {
                let mut r = record(&format!("2024-03-{:02} 06:00:00", i + 1));
                r.units_produced = 100;
                r.good_units = good;
                r.defective_units = 100 - good;
                r
            })
            .collect()
    }

    fn run(data: &[ProductionRecord], field: GroupField) -> Option<TrendAnalysis> {
        let refs: Vec<&ProductionRecord> = data.iter().collect();
        trend(&refs, RankMetric::Quality, field, &AnalysisConfig::default())
    }

    #[test]
    fn test_improving_series() {
        let t = run(&days(&[80, 90, 85, 95]), GroupField::Date).unwrap();
        assert_eq!(t.direction, TrendDirection::Improving);
        assert_eq!(t.best_period, "2024-03-04");
        assert_eq!(t.worst_period, "2024-03-01");
        assert!((t.average - 0.875).abs() < 1e-9);
        assert!(t.volatility > 0.0);
        assert_eq!(t.points.len(), 4);
    }

    #[test]
    fn test_declining_and_stable() {
        let declining = run(&days(&[95, 90]), GroupField::Date).unwrap();
        assert_eq!(declining.direction, TrendDirection::Declining);
        let stable = run(&days(&[90, 70, 90]), GroupField::Date).unwrap();
        assert_eq!(stable.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_dates_are_chronological() {
        let mut data = days(&[80, 90, 85]);
        data.reverse();
        let t = run(&data, GroupField::Date).unwrap();
        let periods: Vec<&str> = t.points.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(periods, vec!["2024-03-01", "2024-03-02", "2024-03-03"]);
    }

    #[test]
    fn test_single_point_has_zero_volatility() {
        let t = run(&days(&[90]), GroupField::Date).unwrap();
        assert_eq!(t.volatility, 0.0);
        assert_eq!(t.direction, TrendDirection::Stable);
        assert_eq!(t.best_period, t.worst_period);
    }

    #[test]
    fn test_empty_input() {
        assert!(run(&[], GroupField::Date).is_none());
    }
}
