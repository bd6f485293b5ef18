//! History analytics pipeline.
//!
//! Query construction → backend fetch → aggregate statistics, per-fish
//! averages, 15-bin histogram, trend series, table projection → CSV export.
//! Everything downstream of the fetch is a pure function of the record
//! list; [`session::AnalyticsSession`] owns the current list and its
//! derived [`session::HistoryView`].

pub mod export;
pub mod histogram;
pub mod query;
pub mod record;
pub mod session;
pub mod stats;
pub mod table;
pub mod trend;

pub use histogram::{BIN_COUNT, Histogram, HistogramBin};
pub use query::{QUERY_LIMIT, QuerySpec};
pub use record::WeightRecord;
pub use session::{AnalyticsSession, HistoryView};
pub use stats::{FishAverageMap, StatsSummary};
