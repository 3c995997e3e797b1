//! Plain-text and JSON rendering of analysis results
//!
//! Text output is a set of sections joined by blank lines; ratios are shown
//! as percentages with two decimals. JSON output is the serde form of the
//! same value types.

use serde::Serialize;

use crate::types::{
    DataOverview, KpiReport, KpiResult, SummaryReport, TopPerformers, TrendAnalysis, UNKNOWN_GROUP,
};

/// Which columns a per-group table shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// Availability, performance, quality, OEE and class
    #[default]
    Oee,
    Efficiency,
    Throughput,
    Downtime,
    Quality,
}

fn pct(v: f64) -> String {
    format!("{:.2}%", v * 100.0)
}

fn opt_pct(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), pct)
}

// ============================================================================
// KPI report
// ============================================================================

/// Render the full report: overall KPIs plus the OEE table per group.
pub fn render_text(report: &KpiReport) -> String {
    render_focus(report, Focus::Oee)
}

/// Render the report with the per-group table restricted to `focus`.
pub fn render_focus(report: &KpiReport, focus: Focus) -> String {
    let mut sections = Vec::new();

    let mut header = vec!["=== Manufacturing KPI Report ===".to_string()];
    if report.filter_start.is_some() || report.filter_end.is_some() {
        header.push(format!(
            "  Period:       {} to {}",
            report.filter_start.map_or_else(|| "start".to_string(), |d| d.to_string()),
            report.filter_end.map_or_else(|| "end".to_string(), |d| d.to_string()),
        ));
    }
    if let Some(range) = report.overall.date_range {
        header.push(format!(
            "  Data covers:  {} to {} ({} days)",
            range.start.date(),
            range.end.date(),
            range.days()
        ));
    }
    header.push(format!("  Records:      {}", report.overall.record_count));
    sections.push(header.join("\n"));

    sections.push(overall_block(&report.overall));

    if let Some(field) = report.group_field {
        let mut lines = vec![format!("--- By {} ---", field)];
        lines.extend(table(&report.groups, focus));
        sections.push(lines.join("\n"));
    }

    if focus == Focus::Downtime && !report.overall.downtime_breakdown.is_empty() {
        let mut lines = vec!["--- Downtime by reason ---".to_string()];
        for entry in &report.overall.downtime_breakdown {
            lines.push(format!(
                "  {:<24} {:>10.1} min  {:>4} events",
                entry.reason, entry.total_minutes, entry.occurrences
            ));
        }
        sections.push(lines.join("\n"));
    }

    sections.join("\n\n") + "\n"
}

fn overall_block(r: &KpiResult) -> String {
    [
        "--- Overall ---".to_string(),
        format!("  OEE:          {} ({})", pct(r.oee), r.classification),
        format!("  Availability: {}", pct(r.availability)),
        format!("  Performance:  {}", pct(r.performance)),
        format!("  Quality:      {}", pct(r.quality)),
        format!("  Efficiency:   {}", pct(r.efficiency)),
        format!("  Throughput:   {:.1} units/hour", r.throughput_per_hour()),
        format!(
            "  Per shift:    {:.1} units avg, {} peak",
            r.throughput.avg_units_per_shift, r.throughput.peak_shift_units
        ),
        format!(
            "  Downtime:     {:.0} min ({} of planned time)",
            r.total_downtime_minutes,
            pct(r.downtime_rate)
        ),
    ]
    .join("\n")
}

fn table(rows: &[KpiResult], focus: Focus) -> Vec<String> {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    let header = match focus {
        Focus::Oee => format!(
            "  {:<12} {:>7} {:>10} {:>10} {:>10} {:>10}  {}",
            "group", "records", "avail", "perf", "quality", "oee", "class"
        ),
        Focus::Efficiency => format!(
            "  {:<12} {:>7} {:>10} {:>10} {:>10}",
            "group", "records", "produced", "target", "efficiency"
        ),
        Focus::Throughput => format!(
            "  {:<12} {:>7} {:>10} {:>12} {:>12} {:>10} {:>8}",
            "group", "records", "produced", "runtime_min", "units/hour", "avg/shift", "peak"
        ),
        Focus::Downtime => format!(
            "  {:<12} {:>7} {:>10} {:>10} {:>10} {:>6}",
            "group", "records", "total_min", "mean_min", "rate", "high"
        ),
        Focus::Quality => format!(
            "  {:<12} {:>7} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "group", "records", "defects", "quality", "best", "worst", "std_dev"
        ),
    };
    lines.push(header);

    for r in rows {
        let line = match focus {
            Focus::Oee => format!(
                "  {:<12} {:>7} {:>10} {:>10} {:>10} {:>10}  {}",
                r.group_key,
                r.record_count,
                pct(r.availability),
                pct(r.performance),
                pct(r.quality),
                pct(r.oee),
                r.classification
            ),
            Focus::Efficiency => format!(
                "  {:<12} {:>7} {:>10} {:>10} {:>10}",
                r.group_key,
                r.record_count,
                r.totals.units_produced,
                r.totals.units_target,
                pct(r.efficiency)
            ),
            Focus::Throughput => format!(
                "  {:<12} {:>7} {:>10} {:>12.0} {:>12.1} {:>10.1} {:>8}",
                r.group_key,
                r.record_count,
                r.totals.units_produced,
                r.totals.runtime_minutes,
                r.throughput_per_hour(),
                r.throughput.avg_units_per_shift,
                r.throughput.peak_shift_units
            ),
            Focus::Downtime => format!(
                "  {:<12} {:>7} {:>10.0} {:>10.1} {:>10} {:>6}",
                r.group_key,
                r.record_count,
                r.total_downtime_minutes,
                r.downtime.mean_minutes,
                pct(r.downtime_rate),
                r.downtime.high_downtime_records
            ),
            Focus::Quality => format!(
                "  {:<12} {:>7} {:>10} {:>10} {:>10} {:>10} {:>10}",
                r.group_key,
                r.record_count,
                r.quality_stats.total_defects,
                pct(r.quality),
                opt_pct(r.quality_stats.best_record_quality),
                opt_pct(r.quality_stats.worst_record_quality),
                opt_pct(r.quality_stats.quality_std_dev)
            ),
        };
        lines.push(line);
    }
    lines
}

// ============================================================================
// Summary, top performers, trend
// ============================================================================

fn overview_block(o: &DataOverview) -> String {
    let mut lines = vec!["--- Data overview ---".to_string()];
    lines.push(format!("  Records:      {}", o.total_records));
    if let Some(range) = o.date_range {
        lines.push(format!(
            "  Date range:   {} to {} ({} days)",
            range.start.date(),
            range.end.date(),
            o.analysis_days
        ));
    }
    lines.push(format!("  Machines:     {} ({})", o.machines.len(), o.machines.join(", ")));
    lines.push(format!("  Operators:    {}", o.operators.len()));
    let shifts: Vec<String> = o.shifts.iter().map(|s| format!("{}={}", s.shift, s.records)).collect();
    lines.push(format!("  Shifts:       {}", shifts.join(", ")));
    lines.join("\n")
}

fn ranked_lines(title: &str, results: &[KpiResult], top: &TopPerformers) -> Vec<String> {
    let mut lines = vec![format!("--- {title} by {} ---", top.metric)];
    for (i, r) in results.iter().enumerate() {
        let label = if r.group_key == UNKNOWN_GROUP {
            "(unknown)"
        } else {
            r.group_key.as_str()
        };
        lines.push(format!("  {}. {:<12} {:.4}", i + 1, label, r.metric(top.metric)));
    }
    if results.is_empty() {
        lines.push("  (no data)".to_string());
    }
    lines
}

/// Render the top machines and operators.
pub fn render_top(top: &TopPerformers) -> String {
    let mut lines = ranked_lines(
        &format!("Top {} of {} machines", top.top_machines.len(), top.total_machines),
        &top.top_machines,
        top,
    );
    lines.push(String::new());
    lines.extend(ranked_lines(
        &format!("Top {} of {} operators", top.top_operators.len(), top.total_operators),
        &top.top_operators,
        top,
    ));
    lines.join("\n") + "\n"
}

/// Render the summary view: overview, overall KPIs and top performers.
pub fn render_summary(summary: &SummaryReport) -> String {
    [
        "=== Manufacturing KPI Summary ===".to_string(),
        overview_block(&summary.overview),
        overall_block(&summary.overall),
        render_top(&summary.top_performers),
    ]
    .join("\n\n")
}

/// Render a metric trend.
pub fn render_trend(trend: &TrendAnalysis) -> String {
    let mut lines = vec![format!("=== {} trend by {} ===", trend.metric, trend.group_field)];
    for p in &trend.points {
        lines.push(format!("  {:<12} {:.4}", p.period, p.value));
    }
    lines.push(String::new());
    lines.push(format!("  Direction:    {}", trend.direction));
    lines.push(format!("  Best period:  {}", trend.best_period));
    lines.push(format!("  Worst period: {}", trend.worst_period));
    lines.push(format!("  Average:      {:.4}", trend.average));
    lines.push(format!("  Volatility:   {:.4}", trend.volatility));
    lines.join("\n") + "\n"
}

/// Pretty-printed JSON of any result type.
///
/// # Errors
///
/// Propagates serialization failures from `serde_json`.
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::engine::{analyze, trend, AnalysisRequest};
    use crate::types::fixtures::record;
    use crate::types::{GroupField, ProductionRecord, RankMetric};

    fn report() -> KpiReport {
        let mut b = record("2024-03-05 14:00:00");
        b.machine_id = Some("B1".to_string());
        b.downtime_reason = Some("Setup".to_string());
        let data = vec![record("2024-03-04 06:00:00"), b];
        let request = AnalysisRequest::new().group_by(GroupField::Machine);
        analyze(&data, &request, &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_text_contains_groups_and_percentages() {
        let text = render_text(&report());
        assert!(text.contains("--- By machine_id ---"));
        assert!(text.contains("A1"));
        assert!(text.contains("B1"));
        assert!(text.contains("68.75%"));
        assert!(text.contains("good"));
    }

    #[test]
    fn test_downtime_focus_lists_reasons() {
        let text = render_focus(&report(), Focus::Downtime);
        assert!(text.contains("Downtime by reason"));
        assert!(text.contains("Setup"));
    }

    #[test]
    fn test_throughput_focus_shows_shift_output() {
        let text = render_focus(&report(), Focus::Throughput);
        assert!(text.contains("avg/shift"));
        assert!(text.contains("peak"));
        // Each machine has one 350-unit shift
        assert!(text.contains("350.0"));
    }

    #[test]
    fn test_quality_focus_shows_spread() {
        let text = render_focus(&report(), Focus::Quality);
        assert!(text.contains("std_dev"));
        // Single-record groups have no spread
        assert!(text.contains("n/a"));
    }

    #[test]
    fn test_json_is_valid() {
        let json = render_json(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["overall"]["group_key"], "all");
        assert_eq!(value["groups"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["overall"]["classification"], "good");
    }

    #[test]
    fn test_render_trend() {
        let data = vec![record("2024-03-04 06:00:00"), record("2024-03-05 06:00:00")];
        let refs: Vec<&ProductionRecord> = data.iter().collect();
        let t = trend(&refs, RankMetric::Oee, GroupField::Date, &AnalysisConfig::default())
            .unwrap();
        let text = render_trend(&t);
        assert!(text.contains("oee trend by date"));
        assert!(text.contains("Direction:    stable"));
    }
}
