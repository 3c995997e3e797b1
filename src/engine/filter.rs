//! Date-range filter stage

use chrono::NaiveDate;
use tracing::debug;

use crate::error::KpiError;
use crate::types::ProductionRecord;

/// Keep records whose calendar date lies within `[start, end]`.
///
/// Both bounds are inclusive whole days; an absent bound leaves that side
/// open. Relative order is preserved and an empty result is not an error.
///
/// # Errors
///
/// [`KpiError::InvalidRange`] when both bounds are given and `start > end`.
pub fn filter<'a, R>(
    records: &'a [R],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<&'a ProductionRecord>, KpiError>
where
    R: AsRef<ProductionRecord>,
{
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(KpiError::InvalidRange { start: s, end: e });
        }
    }

    let kept: Vec<&ProductionRecord> = records
        .iter()
        .map(AsRef::<ProductionRecord>::as_ref)
        .filter(|r| {
            let day = r.date();
            start.map_or(true, |s| day >= s) && end.map_or(true, |e| day <= e)
        })
        .collect();

    debug!(
        input = records.len(),
        kept = kept.len(),
        start = ?start,
        end = ?end,
        "Date filter applied"
    );
    Ok(kept)
}
