//! Aggregate statistics over a result set.

use std::collections::BTreeMap;

use serde::Serialize;

use super::record::WeightRecord;

/// Count, total and mean weight of a result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatsSummary {
    pub count: usize,
    pub total_weight: f64,
    pub avg_weight: f64,
}

/// Mean weight per fish code over the current result set.
pub type FishAverageMap = BTreeMap<String, f64>;

/// Compute [`StatsSummary`] for a result set.
///
/// Unparseable weights contribute 0 to the total but still count. An empty
/// list yields the all-zero summary.
pub fn summarize(records: &[WeightRecord]) -> StatsSummary {
    let count = records.len();
    let total_weight: f64 = records.iter().map(WeightRecord::weight_or_zero).sum();
    let avg_weight = if count > 0 {
        total_weight / count as f64
    } else {
        0.0
    };

    StatsSummary {
        count,
        total_weight,
        avg_weight,
    }
}

/// Per-code accumulator.
#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    total: f64,
    count: usize,
}

/// Mean weight per fish code.
///
/// Codes only appear if at least one record carries them. Same lenient
/// weight policy as [`summarize`].
pub fn fish_averages(records: &[WeightRecord]) -> FishAverageMap {
    let mut sums: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for record in records {
        let acc = sums.entry(record.fish_code.as_str()).or_default();
        acc.total += record.weight_or_zero();
        acc.count += 1;
    }

    sums.into_iter()
        .map(|(code, acc)| (code.to_string(), acc.total / acc.count as f64))
        .collect()
}

/// Per-code totals, used to cross-check aggregates.
pub fn fish_totals(records: &[WeightRecord]) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for record in records {
        *totals.entry(record.fish_code.clone()).or_default() += record.weight_or_zero();
    }
    totals
}
