//! CSV export of the current result set.
//!
//! Output is UTF-8 with a byte-order mark so spreadsheet tools pick the
//! right encoding, every field is double-quoted, and records end in `\n`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::{HistoryError, HistoryResult};

use super::record::WeightRecord;

/// UTF-8 byte-order mark.
pub const BOM: &str = "\u{FEFF}";

/// Fixed header row.
pub const HEADERS: [&str; 4] = ["時間 (Time)", "代碼 (Code)", "名稱 (Name)", "重量 (g)"];

/// Render records to CSV bytes.
///
/// `name_of` resolves a fish code to its display name. Fails with
/// [`HistoryError::NoData`] when `records` is empty.
pub fn to_csv<F>(records: &[WeightRecord], name_of: F) -> HistoryResult<Vec<u8>>
where
    F: Fn(&str) -> Option<String>,
{
    if records.is_empty() {
        return Err(HistoryError::NoData);
    }

    let mut buf = Vec::with_capacity(64 + records.len() * 48);
    buf.extend_from_slice(BOM.as_bytes());

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(buf);

    writer.write_record(HEADERS)?;
    for record in records {
        let time = record.display_time().unwrap_or_else(|| "--".to_string());
        let name = name_of(&record.fish_code).unwrap_or_default();
        let weight = truncate_weight(record.weight).to_string();
        writer.write_record([time.as_str(), record.fish_code.as_str(), name.as_str(), weight.as_str()])?;
    }

    writer
        .into_inner()
        .map_err(|e| HistoryError::Io(e.into_error()))
}

/// Integer weight, truncated toward zero; unparseable → 0.
pub fn truncate_weight(weight: Option<f64>) -> i64 {
    weight.map(|w| w.trunc() as i64).unwrap_or(0)
}

/// `production_history_<YYYYMMDD>.csv`
pub fn file_name(date: NaiveDate) -> String {
    format!("production_history_{}.csv", date.format("%Y%m%d"))
}

/// Write rendered CSV to `dir/<file_name(date)>` and return the path.
pub fn write_to_dir(bytes: &[u8], dir: &Path, date: NaiveDate) -> HistoryResult<PathBuf> {
    let path = dir.join(file_name(date));
    write_to_path(bytes, &path)?;
    Ok(path)
}

/// Write rendered CSV to an explicit path, creating parent directories.
pub fn write_to_path(bytes: &[u8], path: &Path) -> HistoryResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}
