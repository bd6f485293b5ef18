/// Configuration schema and defaults for fishsort.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[backend]`, `[display]`, `[live]`, `[web]` and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level fishsort configuration.
///
/// Maps directly to `~/.fishsort/config.toml` and `.fishsort.toml`. All
/// sections and fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FishsortConfig {
    pub backend: BackendConfig,
    pub display: DisplayConfig,
    pub live: LiveConfig,
    pub web: WebConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Sorting-line backend endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend (REST and WebSocket share the host).
    pub base_url: String,
    /// Per-request timeout in milliseconds. `0` disables the client-side
    /// timeout and trusts the backend to answer.
    pub timeout_ms: u64,
    /// Path of the live WebSocket feed (`/ws`, or `/ws/tags` on some
    /// deployments).
    pub ws_path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_ms: 0,
            ws_path: "/ws".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [display]
// ---------------------------------------------------------------------------

/// Unit the backend reports weights in. Deployments differ, so it is a
/// setting rather than a constant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    G,
    Kg,
}

impl WeightUnit {
    /// Decimal places used when displaying a weight in this unit.
    pub fn precision(self) -> usize {
        match self {
            Self::G => 0,
            Self::Kg => 2,
        }
    }

    /// Format a weight with the unit's precision and label.
    pub fn format(self, weight: f64) -> String {
        format!("{} {}", self.number(weight), self)
    }

    /// Bare number at the unit's precision, rounding halves away from zero.
    pub fn number(self, weight: f64) -> String {
        let scale = self.scale();
        format!("{:.*}", self.precision(), scaled(weight, scale).round() / scale + 0.0)
    }

    /// Bare number cut toward zero at the unit's precision.
    pub fn truncated(self, weight: f64) -> String {
        let scale = self.scale();
        format!("{:.*}", self.precision(), scaled(weight, scale).trunc() / scale + 0.0)
    }

    fn scale(self) -> f64 {
        10f64.powi(self.precision() as i32)
    }
}

/// `weight * scale`, snapped to 1e-6 so `1.15 kg` does not become 114.999….
fn scaled(weight: f64, scale: f64) -> f64 {
    (weight * scale * 1e6).round() / 1e6
}

impl std::fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::G => write!(f, "g"),
            Self::Kg => write!(f, "kg"),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Weight unit label and precision: `g` or `kg`.
    pub weight_unit: WeightUnit,
    /// Maximum rows shown in the history list.
    pub table_rows: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            weight_unit: WeightUnit::default(),
            table_rows: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// [live]
// ---------------------------------------------------------------------------

/// Live feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Fixed delay before reconnecting a dropped feed (seconds).
    pub reconnect_secs: u64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self { reconnect_secs: 3 }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

/// Local dashboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address for `fishsort web`.
    pub addr: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9750".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset: `error`, `warn`, `info`,
    /// `debug` or `trace`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML template
// ---------------------------------------------------------------------------

impl FishsortConfig {
    /// Annotated default config written by `fishsort config init`.
    pub fn default_toml() -> String {
        r#"# fishsort configuration
#
# Layers (highest priority last): built-in defaults, ~/.fishsort/config.toml,
# ./.fishsort.toml, FISHSORT_* environment variables.

[backend]
# Sorting-line backend; REST and WebSocket share this host.
base_url = "http://127.0.0.1:8000"
# Per-request timeout in milliseconds (0 = no client-side timeout).
timeout_ms = 0
# Live feed path: "/ws" or "/ws/tags".
ws_path = "/ws"

[display]
# Unit the backend reports weights in: "g" or "kg".
weight_unit = "g"
# Rows shown in the history list.
table_rows = 100

[live]
# Fixed reconnect delay for the live feed (seconds).
reconnect_secs = 3

[web]
addr = "127.0.0.1:9750"

[logging]
# Used when RUST_LOG is not set.
level = "warn"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_produces_defaults() {
        let config: FishsortConfig = toml::from_str("").unwrap();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.backend.ws_path, "/ws");
        assert_eq!(config.display.weight_unit, WeightUnit::G);
        assert_eq!(config.display.table_rows, 100);
        assert_eq!(config.live.reconnect_secs, 3);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: FishsortConfig = toml::from_str(
            r#"
[display]
weight_unit = "kg"
"#,
        )
        .unwrap();
        assert_eq!(config.display.weight_unit, WeightUnit::Kg);
        assert_eq!(config.display.table_rows, 100);
        assert_eq!(config.backend.timeout_ms, 0);
    }

    #[test]
    fn default_toml_parses_back() {
        let config: FishsortConfig = toml::from_str(&FishsortConfig::default_toml()).unwrap();
        assert_eq!(config.web.addr, "127.0.0.1:9750");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn weight_unit_formatting() {
        assert_eq!(WeightUnit::G.format(1234.56), "1235 g");
        assert_eq!(WeightUnit::Kg.format(1.234), "1.23 kg");
        assert_eq!(WeightUnit::Kg.to_string(), "kg");
    }

    #[test]
    fn weight_unit_rounding_and_truncation() {
        assert_eq!(WeightUnit::G.number(1100.5), "1101");
        assert_eq!(WeightUnit::G.truncated(1234.9), "1234");
        assert_eq!(WeightUnit::Kg.number(1.425), "1.43");
        assert_eq!(WeightUnit::Kg.truncated(1.15), "1.15");
        assert_eq!(WeightUnit::Kg.truncated(1.759), "1.75");
        assert_eq!(WeightUnit::Kg.truncated(-0.001), "0.00");
    }
}
