//! Chronological weight series for trend charts.

use serde::Serialize;

use super::record::WeightRecord;

/// One point on the weight trend line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// Time-of-day part of the timestamp.
    pub label: String,
    pub weight: f64,
}

/// Build the trend series.
///
/// The backend returns newest first; the series runs oldest to newest.
pub fn series(records: &[WeightRecord]) -> Vec<TrendPoint> {
    records
        .iter()
        .rev()
        .map(|r| TrendPoint {
            label: time_label(r.display_time().as_deref().unwrap_or("")),
            weight: r.weight_or_zero(),
        })
        .collect()
}

/// `"2024-01-01 10:00:00"` → `"10:00:00"`; anything without a space is
/// returned whole.
fn time_label(ts: &str) -> String {
    match ts.split_once(' ') {
        Some((_, time)) if !time.is_empty() => time.to_string(),
        _ => ts.to_string(),
    }
}
