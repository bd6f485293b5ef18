/// Configuration system for fishsort.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: [`schema::FishsortConfig::default()`]
/// 2. **User global config**: `~/.fishsort/config.toml`
/// 3. **Project local config**: `.fishsort.toml` in the current directory
/// 4. **Environment variables**: `FISHSORT_*` overrides (highest precedence)
///
/// Each TOML file is deserialized with `serde(default)`, so missing sections
/// fall back to built-in defaults.
///
/// # Usage
///
/// ```rust,ignore
/// use fishsort::config;
///
/// let cfg = config::load();
/// let client = BackendClient::from_config(&cfg.backend);
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

pub use schema::{FishsortConfig, WeightUnit};

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges defaults → global TOML → project TOML → env vars.
pub fn load() -> FishsortConfig {
    let mut config = FishsortConfig::default();

    if let Some(global) = load_toml_file(global_config_path()) {
        config = global;
    }

    if let Some(project) = load_toml_file(project_config_path()) {
        config = project;
    }

    apply_env_overrides(&mut config);

    config
}

/// Load a TOML config file from the given path (if it exists).
///
/// A malformed file is reported and skipped rather than aborting the
/// command.
fn load_toml_file(path: Option<PathBuf>) -> Option<FishsortConfig> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    match toml::from_str(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed config file");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// `~/.fishsort/config.toml`
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".fishsort").join("config.toml"))
}

/// `.fishsort.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".fishsort.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `FISHSORT_BACKEND_URL`: backend base URL
/// - `FISHSORT_TIMEOUT_MS`: request timeout
/// - `FISHSORT_WS_PATH`: live feed path
/// - `FISHSORT_WEIGHT_UNIT`: `g` or `kg`
/// - `FISHSORT_LOG_LEVEL`: default log filter
pub fn apply_env_overrides(config: &mut FishsortConfig) {
    if let Ok(val) = std::env::var("FISHSORT_BACKEND_URL")
        && !val.is_empty()
    {
        config.backend.base_url = val;
    }
    if let Ok(val) = std::env::var("FISHSORT_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.backend.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("FISHSORT_WS_PATH")
        && !val.is_empty()
    {
        config.backend.ws_path = val;
    }
    if let Ok(val) = std::env::var("FISHSORT_WEIGHT_UNIT")
        && let Some(unit) = parse_unit(&val)
    {
        config.display.weight_unit = unit;
    }
    if let Ok(val) = std::env::var("FISHSORT_LOG_LEVEL")
        && !val.is_empty()
    {
        config.logging.level = val;
    }
}

/// Parse a weight unit string.
pub fn parse_unit(val: &str) -> Option<WeightUnit> {
    match val.trim().to_ascii_lowercase().as_str() {
        "g" | "gram" | "grams" => Some(WeightUnit::G),
        "kg" | "kilogram" | "kilograms" => Some(WeightUnit::Kg),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.fishsort/config.toml`.
///
/// Returns an error if the file already exists and `force` is false.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.fishsort/ directory")?;
    }

    fs::write(&path, FishsortConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single dotted key (e.g. `backend.base_url`) in the global config.
///
/// Starts from the existing file, or from serialized defaults when there is
/// none, and validates the result against the schema before writing.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let source = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&FishsortConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&source).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    let _: FishsortConfig = toml::from_str(&output)
        .with_context(|| format!("invalid value for '{key}': '{value}'"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// Only keys the schema defines are accepted, and the default value's type
/// decides how `raw_value` is parsed. Sections missing from `root` are
/// created.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("empty config key segment in '{key}'");
    }
    let (leaf, sections) = parts
        .split_last()
        .with_context(|| format!("empty config key '{key}'"))?;

    let defaults = toml::Value::try_from(FishsortConfig::default())
        .context("failed to serialize default config")?;
    let mut template = &defaults;
    let mut current = root;
    for &part in sections {
        template = template
            .get(part)
            .filter(|v| v.is_table())
            .with_context(|| format!("unknown config key '{key}'"))?;
        current = current
            .as_table_mut()
            .with_context(|| format!("expected table above '{part}' in '{key}'"))?
            .entry(part)
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
    }

    let new_value = match template.get(*leaf) {
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        _ => anyhow::bail!("unknown config key '{key}'"),
    };

    current
        .as_table_mut()
        .with_context(|| format!("expected table for '{key}'"))?
        .insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
