//! KPI Engine Integration Tests
//!
//! End-to-end checks through the public API: filter → group → compute →
//! rank, plus the summary and trend views.

use chrono::{NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use mfg_kpi::config::AnalysisConfig;
use mfg_kpi::engine::{self, AnalysisRequest};
use mfg_kpi::{GroupField, KpiError, KpiTotals, PerformanceClass, ProductionRecord, RankMetric};

const EPS: f64 = 1e-9;

#[allow(clippy::too_many_arguments)]
fn rec(
    ts: &str,
    machine: &str,
    shift: &str,
    operator: &str,
    runtime: f64,
    ideal_cycle: f64,
    produced: u64,
    good: u64,
) -> ProductionRecord {
    ProductionRecord {
        timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap(),
        machine_id: Some(machine.to_string()),
        shift: Some(shift.to_string()),
        operator_id: Some(operator.to_string()),
        planned_production_time: 480.0,
        actual_runtime: runtime,
        ideal_cycle_time: ideal_cycle,
        units_produced: produced,
        units_target: 400,
        good_units: good,
        defective_units: produced - good,
        downtime_minutes: 480.0 - runtime,
        downtime_reason: (runtime < 480.0).then(|| "Changeover".to_string()),
    }
}

fn plant() -> Vec<ProductionRecord> {
    vec![
        rec("2024-03-04 06:00:00", "A1", "Morning", "OP001", 460.0, 1.2, 380, 372),
        rec("2024-03-04 06:00:00", "B2", "Morning", "OP002", 380.0, 1.2, 250, 230),
        rec("2024-03-04 14:00:00", "A1", "Afternoon", "OP003", 450.0, 1.2, 360, 350),
        rec("2024-03-05 22:00:00", "B2", "Night", "OP002", 300.0, 1.2, 200, 180),
        rec("2024-03-06 06:00:00", "C1", "Morning", "OP001", 470.0, 1.0, 440, 436),
        rec("2024-03-07 14:00:00", "A1", "Afternoon", "OP003", 400.0, 1.2, 320, 310),
    ]
}

fn day(d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2024, 3, d)
}

#[test]
fn test_reference_example_classifies_good() {
    let data = vec![rec("2024-03-04 06:00:00", "A1", "Morning", "OP001", 400.0, 1.0, 350, 330)];
    let report = engine::analyze(&data, &AnalysisRequest::new(), &AnalysisConfig::default()).unwrap();
    let r = &report.overall;
    assert!((r.availability - 0.833_333_333).abs() < 1e-6);
    assert!((r.performance - 0.875).abs() < EPS);
    assert!((r.quality - 0.942_857_142).abs() < 1e-6);
    assert!((r.oee - 0.6875).abs() < EPS);
    assert_eq!(r.classification, PerformanceClass::Good);
}

#[test]
fn test_empty_dataset_zero_policy() {
    let data: Vec<ProductionRecord> = Vec::new();
    let report = engine::analyze(&data, &AnalysisRequest::new(), &AnalysisConfig::default()).unwrap();
    let r = &report.overall;
    assert_eq!(r.record_count, 0);
    assert_eq!(r.availability, 0.0);
    assert_eq!(r.performance, 0.0);
    assert_eq!(r.quality, 1.0);
    assert_eq!(r.oee, 0.0);
    assert!(r.downtime_breakdown.is_empty());
}

#[test]
fn test_ratios_bounded_and_oee_is_product() {
    let data = plant();
    let request = AnalysisRequest::new().group_by(GroupField::Machine);
    let report = engine::analyze(&data, &request, &AnalysisConfig::default()).unwrap();
    for r in report.groups.iter().chain(std::iter::once(&report.overall)) {
        for v in [r.availability, r.performance, r.quality, r.oee] {
            assert!((0.0..=1.0).contains(&v), "{} out of range in {}", v, r.group_key);
        }
        assert!((r.oee - r.availability * r.performance * r.quality).abs() < EPS);
    }
}

#[test]
fn test_overall_invariant_across_partitions() {
    let data = plant();
    let config = AnalysisConfig::default();
    for field in [GroupField::Machine, GroupField::Shift, GroupField::Operator, GroupField::Date] {
        let report =
            engine::analyze(&data, &AnalysisRequest::new().group_by(field), &config).unwrap();
        let merged = report
            .groups
            .iter()
            .fold(KpiTotals::default(), |acc, g| acc.merge(g.totals));
        assert!(
            (merged.oee() - report.overall.oee).abs() < EPS,
            "partition by {field} changed overall OEE"
        );
        assert_eq!(merged.record_count, data.len());
    }
}

#[test]
fn test_filter_then_group() {
    let data = plant();
    let request = AnalysisRequest::new()
        .between(day(4), day(5))
        .group_by(GroupField::Machine);
    let report = engine::analyze(&data, &request, &AnalysisConfig::default()).unwrap();
    assert_eq!(report.overall.record_count, 4);
    let keys: Vec<&str> = report.groups.iter().map(|g| g.group_key.as_str()).collect();
    assert_eq!(keys, vec!["A1", "B2"]);
}

#[test]
fn test_invalid_range_rejected() {
    let data = plant();
    let request = AnalysisRequest::new().between(day(7), day(4));
    let err = engine::analyze(&data, &request, &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, KpiError::InvalidRange { .. }));
}

#[test]
fn test_rank_two_groups_top_one() {
    let data = vec![
        // OEE 0.90: full runtime, full speed, 90% good
        rec("2024-03-04 06:00:00", "GOOD", "Morning", "OP001", 480.0, 1.2, 400, 360),
        // OEE 0.50
        rec("2024-03-04 06:00:00", "POOR", "Morning", "OP002", 480.0, 1.2, 400, 200),
    ];
    let report = engine::analyze(
        &data,
        &AnalysisRequest::new().group_by(GroupField::Machine),
        &AnalysisConfig::default(),
    )
    .unwrap();
    let top = engine::rank(&report.groups, "OEE", Some(1)).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].group_key, "GOOD");
    assert!((top[0].oee - 0.90).abs() < EPS);
}

#[test]
fn test_rank_unknown_metric() {
    let err = engine::rank(&[], "group_key", None).unwrap_err();
    assert_eq!(err, KpiError::UnknownMetric("group_key".to_string()));
}

#[test]
fn test_rank_deterministic_and_ordered() {
    let data = plant();
    let report = engine::analyze(
        &data,
        &AnalysisRequest::new().group_by(GroupField::Operator),
        &AnalysisConfig::default(),
    )
    .unwrap();
    let a = engine::rank(&report.groups, "quality_rate", None).unwrap();
    let b = engine::rank(&report.groups, "QualityRate", None).unwrap();
    assert_eq!(a, b);
    assert!(a.windows(2).all(|w| w[0].quality_rate >= w[1].quality_rate));
}

#[test]
fn test_summary_view() {
    let data = plant();
    let refs: Vec<&ProductionRecord> = data.iter().collect();
    let summary = engine::summary(&refs, RankMetric::Oee, 2, &AnalysisConfig::default());
    assert_eq!(summary.overview.total_records, 6);
    assert_eq!(summary.overview.analysis_days, 4);
    assert_eq!(summary.overview.machines, vec!["A1", "B2", "C1"]);
    assert_eq!(summary.top_performers.top_machines.len(), 2);
    assert_eq!(summary.top_performers.total_operators, 3);
    assert_eq!(summary.top_performers.top_machines[0].group_key, "C1");
}

#[test]
fn test_daily_trend() {
    let data = plant();
    let refs: Vec<&ProductionRecord> = data.iter().collect();
    let t = engine::trend(&refs, RankMetric::Oee, GroupField::Date, &AnalysisConfig::default())
        .unwrap();
    let periods: Vec<&str> = t.points.iter().map(|p| p.period.as_str()).collect();
    assert_eq!(periods, vec!["2024-03-04", "2024-03-05", "2024-03-06", "2024-03-07"]);
    assert_eq!(t.best_period, "2024-03-06");
    assert_eq!(t.worst_period, "2024-03-05");
}

#[test]
fn test_downtime_breakdown_aggregates_reasons() {
    let data = plant();
    let report =
        engine::analyze(&data, &AnalysisRequest::new(), &AnalysisConfig::default()).unwrap();
    let breakdown = &report.overall.downtime_breakdown;
    assert_eq!(breakdown.len(), 1);
    assert_eq!(breakdown[0].reason, "Changeover");
    assert_eq!(breakdown[0].occurrences, 6);
    let total: f64 = data.iter().map(|r| r.downtime_minutes).sum();
    assert!((breakdown[0].total_minutes - total).abs() < EPS);
}

#[test]
fn test_kpis_bit_identical_under_row_shuffle() {
    // Fractional minutes so that summation order would show in the last bits
    let mut data = Vec::new();
    for (i, runtime) in [433.7, 401.3, 377.9, 459.1, 412.6, 388.85, 470.05, 359.45]
        .into_iter()
        .enumerate()
    {
        let machine = ["A1", "B2", "C1"][i % 3];
        let ts = format!("2024-03-0{} 06:00:00", 4 + i % 4);
        let produced = 300 + 11 * i as u64;
        data.push(rec(&ts, machine, "Morning", "OP001", runtime, 1.13, produced, produced - 3));
    }

    let config = AnalysisConfig::default();
    let request = AnalysisRequest::new().group_by(GroupField::Machine);
    let baseline = engine::analyze(&data, &request, &config).unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    let mut orders = vec![data.iter().rev().cloned().collect::<Vec<_>>()];
    for _ in 0..5 {
        let mut shuffled = data.clone();
        shuffled.shuffle(&mut rng);
        orders.push(shuffled);
    }

    for rows in orders {
        let report = engine::analyze(&rows, &request, &config).unwrap();
        assert_eq!(report.overall, baseline.overall);
        assert_eq!(report.overall.oee.to_bits(), baseline.overall.oee.to_bits());
        assert_eq!(report.groups.len(), baseline.groups.len());
        for expected in &baseline.groups {
            let actual = report
                .groups
                .iter()
                .find(|g| g.group_key == expected.group_key)
                .unwrap();
            assert_eq!(actual, expected);
        }
    }
}
