//! Result assembler: overall plus per-group KPIs, and the summary views
//! built on top of them

use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use super::calculator::KpiCalculator;
use super::grouping::{group, GroupedDataset};
use super::ranking::rank_by;
use crate::config::AnalysisConfig;
use crate::types::{
    DataOverview, DateRange, GroupField, KpiReport, KpiResult, ProductionRecord, RankMetric,
    ShiftCount, SummaryReport, TopPerformers, ALL_GROUP,
};

/// Compute one result per group, in group order.
///
/// Switches to rayon once the group count reaches
/// `config.parallel.min_groups`; `collect` keeps the input order either way.
pub fn compute_groups(grouped: &GroupedDataset<'_>, config: &AnalysisConfig) -> Vec<KpiResult> {
    let calculator = KpiCalculator::new(config);
    if grouped.len() >= config.parallel.min_groups {
        debug!(groups = grouped.len(), "Computing group KPIs in parallel");
        grouped
            .groups()
            .par_iter()
            .map(|g| calculator.compute(&g.key, &g.records))
            .collect()
    } else {
        grouped
            .iter()
            .map(|g| calculator.compute(&g.key, &g.records))
            .collect()
    }
}

/// Build the report for an already-filtered record set.
///
/// The overall row is computed from the whole set, never by averaging group
/// results. With no grouping field `groups` holds the single `"all"` result.
pub fn assemble(
    records: &[&ProductionRecord],
    group_field: Option<GroupField>,
    config: &AnalysisConfig,
) -> KpiReport {
    let calculator = KpiCalculator::new(config);
    let overall = calculator.compute(ALL_GROUP, records);

    let groups = match group_field {
        None => vec![overall.clone()],
        Some(_) => compute_groups(&group(records, group_field), config),
    };

    info!(
        records = overall.record_count,
        groups = groups.len(),
        oee = overall.oee,
        class = %overall.classification,
        "KPI report assembled"
    );

    KpiReport {
        group_field,
        filter_start: None,
        filter_end: None,
        overall,
        groups,
    }
}

/// Dataset shape: counts, covered dates and distinct dimension values.
pub fn overview(records: &[&ProductionRecord]) -> DataOverview {
    let date_range = DateRange::covering(records.iter().copied());

    let machines: BTreeSet<String> = records
        .iter()
        .filter_map(|r| r.dimension(GroupField::Machine))
        .collect();
    let operators: BTreeSet<String> = records
        .iter()
        .filter_map(|r| r.dimension(GroupField::Operator))
        .collect();
    let mut shifts: BTreeMap<String, usize> = BTreeMap::new();
    for r in records {
        if let Some(shift) = r.dimension(GroupField::Shift) {
            *shifts.entry(shift).or_default() += 1;
        }
    }

    DataOverview {
        total_records: records.len(),
        date_range,
        analysis_days: date_range.map_or(0, |d| d.days()),
        machines: machines.into_iter().collect(),
        operators: operators.into_iter().collect(),
        shifts: shifts
            .into_iter()
            .map(|(shift, records)| ShiftCount { shift, records })
            .collect(),
    }
}

/// Best `top_n` machines and operators by `metric`.
///
/// Records missing the dimension form an `"unknown"` group and are ranked
/// like any other.
pub fn top_performers(
    records: &[&ProductionRecord],
    metric: RankMetric,
    top_n: usize,
    config: &AnalysisConfig,
) -> TopPerformers {
    let machines = compute_groups(&group(records, Some(GroupField::Machine)), config);
    let operators = compute_groups(&group(records, Some(GroupField::Operator)), config);

    TopPerformers {
        metric,
        total_machines: machines.len(),
        total_operators: operators.len(),
        top_machines: rank_by(&machines, metric, Some(top_n)),
        top_operators: rank_by(&operators, metric, Some(top_n)),
    }
}

/// Overview, overall KPIs and top performers in one structure.
pub fn summary(
    records: &[&ProductionRecord],
    metric: RankMetric,
    top_n: usize,
    config: &AnalysisConfig,
) -> SummaryReport {
    SummaryReport {
        overview: overview(records),
        overall: KpiCalculator::new(config).compute(ALL_GROUP, records),
        top_performers: top_performers(records, metric, top_n, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::record;
    use crate::types::KpiTotals;

    fn fleet() -> Vec<ProductionRecord> {
        let mut out = Vec::new();
        for (i, (machine, shift, op)) in [
            ("B1", "Night", "OP002"),
            ("A1", "Morning", "OP001"),
            ("B1", "Morning", "OP003"),
            ("C2", "Afternoon", "OP001"),
            ("A1", "Night", "OP002"),
        ]
        .into_iter()
        .enumerate()
        {
            let mut r = record(&format!("2024-03-0{} 06:00:00", i + 1));
            r.machine_id = Some(machine.to_string());
            r.shift = Some(shift.to_string());
            r.operator_id = Some(op.to_string());
            r.actual_runtime = 300.0 + 30.0 * i as f64;
            r.downtime_minutes = 480.0 - r.actual_runtime;
            r.units_produced = 250 + 20 * i as u64;
            r.defective_units = 5 * i as u64;
            r.good_units = r.units_produced - r.defective_units;
            out.push(r);
        }
        out
    }

    #[test]
    fn test_overall_equals_merged_group_totals() {
        let data = fleet();
        let refs: Vec<&ProductionRecord> = data.iter().collect();
        let config = AnalysisConfig::default();
        let report = assemble(&refs, Some(GroupField::Machine), &config);

        let merged = report
            .groups
            .iter()
            .fold(KpiTotals::default(), |acc, g| acc.merge(g.totals));
        assert_eq!(merged.record_count, report.overall.totals.record_count);
        assert_eq!(merged.units_produced, report.overall.totals.units_produced);
        assert!((merged.oee() - report.overall.oee).abs() < 1e-9);
        assert_eq!(report.overall.group_key, "all");
    }

    #[test]
    fn test_groups_in_first_occurrence_order() {
        let data = fleet();
        let refs: Vec<&ProductionRecord> = data.iter().collect();
        let report = assemble(&refs, Some(GroupField::Machine), &AnalysisConfig::default());
        let keys: Vec<&str> = report.groups.iter().map(|g| g.group_key.as_str()).collect();
        assert_eq!(keys, vec!["B1", "A1", "C2"]);
    }

    #[test]
    fn test_no_grouping_single_all_group() {
        let data = fleet();
        let refs: Vec<&ProductionRecord> = data.iter().collect();
        let report = assemble(&refs, None, &AnalysisConfig::default());
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0], report.overall);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let data = fleet();
        let refs: Vec<&ProductionRecord> = data.iter().collect();
        let grouped = group(&refs, Some(GroupField::Date));

        let mut sequential = AnalysisConfig::default();
        sequential.parallel.min_groups = usize::MAX;
        let mut parallel = AnalysisConfig::default();
        parallel.parallel.min_groups = 1;

        assert_eq!(
            compute_groups(&grouped, &sequential),
            compute_groups(&grouped, &parallel)
        );
    }

    #[test]
    fn test_overview() {
        let data = fleet();
        let refs: Vec<&ProductionRecord> = data.iter().collect();
        let o = overview(&refs);
        assert_eq!(o.total_records, 5);
        assert_eq!(o.analysis_days, 5);
        assert_eq!(o.machines, vec!["A1", "B1", "C2"]);
        assert_eq!(o.operators, vec!["OP001", "OP002", "OP003"]);
        let shifts: Vec<(&str, usize)> =
            o.shifts.iter().map(|s| (s.shift.as_str(), s.records)).collect();
        assert_eq!(shifts, vec![("Afternoon", 1), ("Morning", 2), ("Night", 2)]);
    }

    #[test]
    fn test_overview_empty() {
        let o = overview(&[]);
        assert_eq!(o.total_records, 0);
        assert_eq!(o.analysis_days, 0);
        assert!(o.date_range.is_none());
    }

    #[test]
    fn test_top_performers() {
        let data = fleet();
        let refs: Vec<&ProductionRecord> = data.iter().collect();
        let top = top_performers(&refs, RankMetric::Oee, 2, &AnalysisConfig::default());
        assert_eq!(top.total_machines, 3);
        assert_eq!(top.total_operators, 3);
        assert_eq!(top.top_machines.len(), 2);
        assert!(top.top_machines[0].oee >= top.top_machines[1].oee);
    }
}
