//! The analytics session: single owner of the fish-type map and the
//! current result set.
//!
//! Renderers receive a `&HistoryView` from the session instead of reading
//! shared state. Installing a new result set replaces the whole view in one
//! step, so derived data can never drift from the records it came from.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::backend::client::{BackendClient, FishType};
use crate::config::WeightUnit;
use crate::error::{BackendResult, HistoryResult};

use super::export;
use super::histogram::Histogram;
use super::query::QuerySpec;
use super::record::WeightRecord;
use super::stats::{self, FishAverageMap, StatsSummary};
use super::table::{self, TableView};
use super::trend::{self, TrendPoint};

/// Everything derived from one result set.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    pub records: Vec<WeightRecord>,
    pub stats: StatsSummary,
    pub fish_averages: FishAverageMap,
    pub histogram: Option<Histogram>,
    pub trend: Vec<TrendPoint>,
}

impl HistoryView {
    /// Derive all aggregates from `records`; histogram labels use `unit`.
    pub fn from_records(records: Vec<WeightRecord>, unit: WeightUnit) -> Self {
        let stats = stats::summarize(&records);
        let fish_averages = stats::fish_averages(&records);
        let histogram = Histogram::build(records.iter().filter_map(|r| r.weight), unit);
        let trend = trend::series(&records);

        Self {
            records,
            stats,
            fish_averages,
            histogram,
            trend,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mean-weight overlay position within the histogram, if drawable.
    pub fn mean_ratio(&self) -> Option<f64> {
        self.histogram
            .as_ref()
            .and_then(|h| h.mean_ratio(self.stats.avg_weight))
    }
}

/// Fish map plus the latest installed result set.
#[derive(Debug, Default)]
pub struct AnalyticsSession {
    fish_names: HashMap<String, String>,
    view: Option<HistoryView>,
    revision: u64,
    unit: WeightUnit,
}

impl AnalyticsSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session whose labels and table values are formatted for `unit`.
    pub fn with_unit(unit: WeightUnit) -> Self {
        Self {
            unit,
            ..Self::default()
        }
    }

    pub fn unit(&self) -> WeightUnit {
        self.unit
    }

    /// Replace the fish-type name map.
    pub fn set_fish_types(&mut self, types: &[FishType]) {
        self.fish_names = types
            .iter()
            .map(|t| (t.code.clone(), t.name.clone()))
            .collect();
    }

    /// Reload the fish map from the backend.
    ///
    /// A failure leaves the previous map in place; names then show as
    /// unknown but the history pipeline keeps working.
    pub fn refresh_fish_types(&mut self, client: &BackendClient) {
        match client.fish_types() {
            Ok(types) => self.set_fish_types(&types),
            Err(e) => warn!(error = %e, "fish types unavailable, names will be blank"),
        }
    }

    /// Run `query` against the backend and install the result.
    ///
    /// The previous result set is dropped before the fetch, so a failed
    /// query leaves nothing stale behind to export.
    pub fn run_query(
        &mut self,
        client: &BackendClient,
        query: &QuerySpec,
    ) -> BackendResult<&HistoryView> {
        self.clear();
        info!(query = %query.describe(), "querying history");
        let records = client.history(query)?;
        Ok(self.install(records))
    }

    /// Display name for a code, if known.
    pub fn fish_name(&self, code: &str) -> Option<String> {
        self.fish_names.get(code).cloned()
    }

    /// Install a freshly fetched result set, superseding the previous one.
    pub fn install(&mut self, records: Vec<WeightRecord>) -> &HistoryView {
        self.revision += 1;
        info!(
            revision = self.revision,
            records = records.len(),
            "installing history result set"
        );
        self.view.insert(HistoryView::from_records(records, self.unit))
    }

    /// Drop the current result set (e.g. when a query fails).
    pub fn clear(&mut self) {
        self.view = None;
    }

    pub fn view(&self) -> Option<&HistoryView> {
        self.view.as_ref()
    }

    /// Number of result sets installed so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether there is anything to export or list.
    pub fn has_data(&self) -> bool {
        self.view.as_ref().is_some_and(|v| !v.is_empty())
    }

    /// Table projection of the current result set.
    pub fn table(&self, max_rows: usize) -> Option<TableView> {
        self.view.as_ref().map(|v| {
            table::project(&v.records, &v.fish_averages, max_rows, self.unit, |c| {
                self.fish_name(c)
            })
        })
    }

    /// CSV export of the in-memory result set (no refetch).
    pub fn export_csv(&self) -> HistoryResult<Vec<u8>> {
        let records = self.view.as_ref().map(|v| v.records.as_slice()).unwrap_or(&[]);
        export::to_csv(records, |c| self.fish_name(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HistoryError;

    fn fish_types() -> Vec<FishType> {
        vec![FishType {
            code: "F001".to_string(),
            name: "白鯧".to_string(),
        }]
    }

    #[test]
    fn install_derives_everything_at_once() {
        let mut session = AnalyticsSession::new();
        let view = session.install(vec![
            WeightRecord::new("2024-01-01T10:00:05", "F001", 300.0),
            WeightRecord::new("2024-01-01T10:00:00", "F001", 100.0),
        ]);
        assert_eq!(view.stats.count, 2);
        assert_eq!(view.fish_averages["F001"], 200.0);
        assert_eq!(view.histogram.as_ref().unwrap().total(), 2);
        assert_eq!(view.trend[0].weight, 100.0);
        assert_eq!(view.mean_ratio(), Some(0.5));
    }

    #[test]
    fn later_result_set_replaces_earlier_one() {
        let mut session = AnalyticsSession::new();
        session.install(vec![WeightRecord::new("2024-01-01T10:00:00", "F001", 100.0); 5]);
        session.install(vec![WeightRecord::new("2024-01-02T10:00:00", "F002", 50.0)]);

        let view = session.view().unwrap();
        assert_eq!(session.revision(), 2);
        assert_eq!(view.stats.count, 1);
        assert!(!view.fish_averages.contains_key("F001"));
        assert_eq!(view.histogram.as_ref().unwrap().total(), 1);
    }

    #[test]
    fn export_requires_data() {
        let mut session = AnalyticsSession::new();
        assert!(matches!(session.export_csv(), Err(HistoryError::NoData)));

        session.install(Vec::new());
        assert!(!session.has_data());
        assert!(matches!(session.export_csv(), Err(HistoryError::NoData)));
    }

    #[test]
    fn export_uses_fish_names() {
        let mut session = AnalyticsSession::new();
        session.set_fish_types(&fish_types());
        session.install(vec![WeightRecord::new("2024-01-01T10:00:00", "F001", 1234.9)]);
        let text = String::from_utf8(session.export_csv().unwrap()).unwrap();
        assert!(text.contains(r#""2024-01-01 10:00:00","F001","白鯧","1234""#));
    }

    #[test]
    fn empty_view_has_zero_stats_and_no_histogram() {
        let mut session = AnalyticsSession::new();
        let view = session.install(Vec::new());
        assert_eq!(view.stats, StatsSummary::default());
        assert!(view.histogram.is_none());
        assert_eq!(view.mean_ratio(), None);
    }

    #[test]
    fn kilogram_session_formats_labels_and_rows() {
        let mut session = AnalyticsSession::with_unit(WeightUnit::Kg);
        session.install(vec![
            WeightRecord::new("2024-01-01T10:00:02", "F001", 1.75),
            WeightRecord::new("2024-01-01T10:00:01", "F001", 1.10),
            WeightRecord::new("2024-01-01T10:00:00", "F001", 0.80),
        ]);

        let hist = session.view().unwrap().histogram.clone().unwrap();
        assert_eq!(hist.bins[0].range_label, "0.80-0.86");
        assert_eq!(hist.bins[14].range_label, "1.69-1.75");

        let table = session.table(10).unwrap();
        let weights: Vec<&str> = table.rows.iter().map(|r| r.weight.as_str()).collect();
        assert_eq!(weights, ["1.75", "1.10", "0.80"]);
        assert_eq!(table.rows[0].fish_avg, "1.22");

        // Export stays in whole grams regardless of display unit.
        let text = String::from_utf8(session.export_csv().unwrap()).unwrap();
        assert!(text.contains(r#""F001","","1""#));
    }

    #[test]
    fn clear_drops_view() {
        let mut session = AnalyticsSession::new();
        session.install(vec![WeightRecord::new("2024-01-01T10:00:00", "F001", 1.0)]);
        session.clear();
        assert!(session.view().is_none());
        assert!(session.table(10).is_none());
    }
}
