//! Ranking engine: order group results by one metric

use tracing::debug;

use crate::error::KpiError;
use crate::types::{KpiResult, RankMetric};

/// Rank `results` by the metric named `metric`.
///
/// Orders by metric descending, ties by group key ascending, and keeps the
/// first `top_n` entries (all of them when `top_n` is `None` or too large).
///
/// # Errors
///
/// [`KpiError::UnknownMetric`] when `metric` is not a numeric KPI field.
pub fn rank(
    results: &[KpiResult],
    metric: &str,
    top_n: Option<usize>,
) -> Result<Vec<KpiResult>, KpiError> {
    let metric: RankMetric = metric.parse()?;
    Ok(rank_by(results, metric, top_n))
}

/// Typed variant of [`rank`].
pub fn rank_by(results: &[KpiResult], metric: RankMetric, top_n: Option<usize>) -> Vec<KpiResult> {
    let mut ranked: Vec<KpiResult> = results.to_vec();
    ranked.sort_by(|a, b| {
        b.metric(metric)
            .total_cmp(&a.metric(metric))
            .then_with(|| a.group_key.cmp(&b.group_key))
    });
    if let Some(n) = top_n {
        ranked.truncate(n);
    }
    debug!(metric = %metric, ranked = ranked.len(), of = results.len(), "Results ranked");
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::engine::KpiCalculator;
    use crate::types::fixtures::record;
    use crate::types::ProductionRecord;

    /// A result whose OEE is fixed by scaling good units.
    fn result_with_oee(key: &str, config: &AnalysisConfig, good: u64) -> KpiResult {
        let mut r = record("2024-03-04 06:00:00");
        // availability 1, performance 1 → OEE == quality == good / 400
        r.actual_runtime = 480.0;
        r.downtime_minutes = 0.0;
        r.ideal_cycle_time = 1.2;
        r.units_produced = 400;
        r.good_units = good;
        r.defective_units = 400 - good;
        let refs: Vec<&ProductionRecord> = vec![&r];
        KpiCalculator::new(config).compute(key, &refs)
    }

    #[test]
    fn test_top_one_by_oee() {
        let config = AnalysisConfig::default();
        let results = vec![
            result_with_oee("B2", &config, 200), // 0.50
            result_with_oee("A1", &config, 360), // 0.90
        ];
        assert!((results[1].oee - 0.90).abs() < 1e-9);
        let top = rank(&results, "OEE", Some(1)).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].group_key, "A1");
    }

    #[test]
    fn test_ties_broken_by_key() {
        let config = AnalysisConfig::default();
        let results = vec![
            result_with_oee("C1", &config, 300),
            result_with_oee("A2", &config, 300),
            result_with_oee("B1", &config, 380),
        ];
        let ranked = rank(&results, "oee", None).unwrap();
        let keys: Vec<&str> = ranked.iter().map(|r| r.group_key.as_str()).collect();
        assert_eq!(keys, vec!["B1", "A2", "C1"]);
    }

    #[test]
    fn test_top_n_larger_than_input_returns_all() {
        let config = AnalysisConfig::default();
        let results = vec![result_with_oee("A1", &config, 300), result_with_oee("A2", &config, 320)];
        assert_eq!(rank(&results, "quality", Some(10)).unwrap().len(), 2);
        assert!(rank(&results, "quality", Some(0)).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_metric() {
        let err = rank(&[], "happiness", None).unwrap_err();
        assert_eq!(err, KpiError::UnknownMetric("happiness".to_string()));
    }

    #[test]
    fn test_rank_is_deterministic() {
        let config = AnalysisConfig::default();
        let results: Vec<KpiResult> = (0..6)
            .map(|i| result_with_oee(&format!("M{}", i % 3), &config, 300 + (i % 2) * 10))
            .collect();
        let first = rank(&results, "oee", None).unwrap();
        let second = rank(&results, "oee", None).unwrap();
        assert_eq!(first, second);
    }
}
