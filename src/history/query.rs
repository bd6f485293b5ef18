//! History query construction.

use chrono::{DateTime, Duration, Local, TimeZone};
use serde::Serialize;

use super::record::normalize_separator;

/// Hard ceiling on records per query. Bounds payload size and the cost of
/// everything downstream; not user-configurable.
pub const QUERY_LIMIT: u32 = 2000;

/// Default look-back window when the user gives no start time.
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

/// Format of the minute-precision local timestamps the date inputs use.
const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Parameters for `GET /api/history`.
///
/// An absent `fish_code` means "all fish types".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuerySpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fish_code: Option<String>,
    pub limit: u32,
}

impl QuerySpec {
    /// Build a query from raw user input.
    ///
    /// Empty strings count as absent. Start/end get their `T` separator
    /// replaced by a space; `limit` is always [`QUERY_LIMIT`].
    pub fn build(start: Option<&str>, end: Option<&str>, fish_code: Option<&str>) -> Self {
        fn present(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }

        Self {
            start_time: present(start).map(normalize_separator),
            end_time: present(end).map(normalize_separator),
            fish_code: present(fish_code).map(str::to_string),
            limit: QUERY_LIMIT,
        }
    }

    /// Query-string pairs in the order the backend documents them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(4);
        if let Some(start) = &self.start_time {
            pairs.push(("start_time", start.clone()));
        }
        if let Some(end) = &self.end_time {
            pairs.push(("end_time", end.clone()));
        }
        if let Some(code) = &self.fish_code {
            pairs.push(("fish_code", code.clone()));
        }
        pairs.push(("limit", self.limit.to_string()));
        pairs
    }

    /// Short human description for headers and log lines.
    pub fn describe(&self) -> String {
        format!(
            "{} → {} [{}]",
            self.start_time.as_deref().unwrap_or("…"),
            self.end_time.as_deref().unwrap_or("…"),
            self.fish_code.as_deref().unwrap_or("all types"),
        )
    }
}

/// Default `(start, end)` inputs: the last 24 hours ending now, local time.
pub fn default_range() -> (String, String) {
    default_range_at(&Local::now())
}

/// Default range relative to an explicit instant.
pub fn default_range_at<Tz: TimeZone>(now: &DateTime<Tz>) -> (String, String)
where
    Tz::Offset: std::fmt::Display,
{
    let start = now.clone() - Duration::hours(DEFAULT_WINDOW_HOURS);
    (to_input_value(&start), to_input_value(now))
}

/// Render an instant the way a `datetime-local` input holds it: wall-clock
/// time in its own zone, truncated to minutes.
pub fn to_input_value<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(INPUT_FORMAT).to_string()
}
