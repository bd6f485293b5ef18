//! Weight-event records as returned by `GET /api/history`.

use serde::{Deserialize, Deserializer, Serialize};

/// One weighing event from the sorting line.
///
/// The backend is loose about types: `weight` arrives as a number on most
/// deployments and as a string on older ones, and `fish_code` may be null
/// for events logged before a category was set. Deserialisation never fails
/// on those fields; unusable weights become `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRecord {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub fish_code: String,
    #[serde(default, deserialize_with = "lenient_weight")]
    pub weight: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

impl WeightRecord {
    pub fn new(timestamp: &str, fish_code: &str, weight: f64) -> Self {
        Self {
            timestamp: Some(timestamp.to_string()),
            fish_code: fish_code.to_string(),
            weight: Some(weight),
            status: None,
        }
    }

    /// Weight with the lenient zero substitution used by all aggregates.
    pub fn weight_or_zero(&self) -> f64 {
        self.weight.unwrap_or(0.0)
    }

    /// Timestamp with the `T` separator replaced by a space, if present.
    pub fn display_time(&self) -> Option<String> {
        self.timestamp.as_deref().map(normalize_separator)
    }
}

/// Replace the ISO `T` date/time separator with a space.
pub fn normalize_separator(ts: &str) -> String {
    ts.replacen('T', " ", 1)
}

/// Parse the longest numeric prefix of `s`, the way browsers' `parseFloat`
/// does (`"12.5g"` → 12.5, `" 7"` → 7, `"abc"` → `None`).
///
/// Non-finite results are rejected.
pub fn parse_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let candidate_len = s
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .map(|(i, _)| i)
        .unwrap_or(s.len());

    (1..=candidate_len)
        .rev()
        .find_map(|end| s[..end].parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

pub(crate) fn lenient_weight<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        serde_json::Value::String(s) => parse_float(&s),
        _ => None,
    })
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_float_takes_numeric_prefix() {
        assert_eq!(parse_float("12.5g"), Some(12.5));
        assert_eq!(parse_float("  7"), Some(7.0));
        assert_eq!(parse_float("-3.25"), Some(-3.25));
        assert_eq!(parse_float("1e3kg"), Some(1000.0));
        assert_eq!(parse_float("1e"), Some(1.0));
        assert_eq!(parse_float(".5"), Some(0.5));
    }

    #[test]
    fn parse_float_rejects_non_numbers() {
        assert_eq!(parse_float("abc"), None);
        assert_eq!(parse_float(""), None);
        assert_eq!(parse_float("-"), None);
        assert_eq!(parse_float("inf"), None);
        assert_eq!(parse_float("NaN"), None);
    }

    #[test]
    fn deserializes_numeric_and_string_weights() {
        let json = r#"[
            {"timestamp": "2024-01-01T10:00:00", "fish_code": "F001", "weight": 1234.9, "status": "RUN"},
            {"timestamp": "2024-01-01T10:00:05", "fish_code": "F002", "weight": "850"},
            {"timestamp": "2024-01-01T10:00:10", "fish_code": null, "weight": "n/a"},
            {"fish_code": "F003"}
        ]"#;
        let records: Vec<WeightRecord> = serde_json::from_str(json).unwrap();

        assert_eq!(records[0].weight, Some(1234.9));
        assert_eq!(records[0].status.as_deref(), Some("RUN"));
        assert_eq!(records[1].weight, Some(850.0));
        assert_eq!(records[2].fish_code, "");
        assert_eq!(records[2].weight, None);
        assert_eq!(records[2].weight_or_zero(), 0.0);
        assert_eq!(records[3].timestamp, None);
        assert_eq!(records[3].weight, None);
    }

    #[test]
    fn display_time_replaces_separator() {
        let record = WeightRecord::new("2024-01-01T10:00:00", "F001", 1.0);
        assert_eq!(record.display_time().as_deref(), Some("2024-01-01 10:00:00"));
        assert_eq!(normalize_separator("2024-01-01 10:00"), "2024-01-01 10:00");
    }
}
