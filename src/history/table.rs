//! Tabular projection of a result set for list views.

use serde::Serialize;

use crate::config::WeightUnit;

use super::record::WeightRecord;
use super::stats::FishAverageMap;

/// One row of the history list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub time: String,
    pub code: String,
    pub name: String,
    /// Weight cut toward zero at the display unit's precision.
    pub weight: String,
    /// Mean weight of this row's fish type, `"-"` when there is none.
    pub fish_avg: String,
}

/// The first `max_rows` records plus the total, so renderers can note the cut.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub rows: Vec<TableRow>,
    pub total: usize,
}

impl TableView {
    pub fn is_truncated(&self) -> bool {
        self.total > self.rows.len()
    }
}

/// Project records into display rows, formatting weights for `unit`.
pub fn project<F>(
    records: &[WeightRecord],
    averages: &FishAverageMap,
    max_rows: usize,
    unit: WeightUnit,
    name_of: F,
) -> TableView
where
    F: Fn(&str) -> Option<String>,
{
    let rows = records
        .iter()
        .take(max_rows)
        .map(|r| TableRow {
            time: r.display_time().unwrap_or_else(|| "--".to_string()),
            code: if r.fish_code.is_empty() {
                "--".to_string()
            } else {
                r.fish_code.clone()
            },
            name: name_of(&r.fish_code).unwrap_or_else(|| "--".to_string()),
            weight: unit.truncated(r.weight_or_zero()),
            fish_avg: match averages.get(&r.fish_code) {
                Some(avg) if *avg != 0.0 => unit.number(*avg),
                _ => "-".to_string(),
            },
        })
        .collect();

    TableView {
        rows,
        total: records.len(),
    }
}
