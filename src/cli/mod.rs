//! CLI command implementations for fishsort.
//!
//! Provides subcommand handlers for:
//! - `fishsort history`: query, statistics, histogram, record list
//! - `fishsort export`: CSV export of a query
//! - `fishsort types`: fish-type mapping
//! - `fishsort mix`: production-mix summary
//! - `fishsort watch`: live line status
//! - `fishsort health`: backend and config checks
//! - `fishsort config show|init|set|reset`: configuration management

use std::io;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use colored::Colorize;
use tracing::info;

use crate::backend::client::{BackendClient, FishType, ProductionMix};
use crate::backend::live::{self, LiveState};
use crate::config::{self, FishsortConfig, WeightUnit};
use crate::error::HistoryError;
use crate::history::export;
use crate::history::histogram::{BIN_COUNT, Histogram, overlay_x};
use crate::history::query::{self, QuerySpec};
use crate::history::session::{AnalyticsSession, HistoryView};
use crate::history::table::TableView;

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Time range and filter as typed on the command line.
#[derive(Debug, Clone, Default)]
pub struct QueryArgs {
    pub start: Option<String>,
    pub end: Option<String>,
    pub fish: Option<String>,
}

impl QueryArgs {
    /// Build the query, filling an unset start/end with the default
    /// 24-hour window. An explicitly empty value removes that bound.
    pub fn to_query(&self) -> QuerySpec {
        let (default_start, default_end) = query::default_range();
        let start = self.start.clone().unwrap_or(default_start);
        let end = self.end.clone().unwrap_or(default_end);
        QuerySpec::build(Some(&start), Some(&end), self.fish.as_deref())
    }
}

/// Where an export goes: an explicit file, or the dated default name in a
/// directory.
#[derive(Debug, Clone)]
pub enum ExportTarget {
    File(PathBuf),
    Dir(PathBuf),
}

// ---------------------------------------------------------------------------
// fishsort history
// ---------------------------------------------------------------------------

/// Query history and show statistics, histogram and the record list.
pub fn run_history(
    args: &QueryArgs,
    format: OutputFormat,
    export_to: Option<ExportTarget>,
) -> Result<()> {
    let cfg = config::load();
    let client = BackendClient::from_config(&cfg.backend);
    let mut session = AnalyticsSession::with_unit(cfg.display.weight_unit);
    session.refresh_fish_types(&client);

    let query = args.to_query();
    session
        .run_query(&client, &query)
        .context("history query failed")?;

    match format {
        OutputFormat::Json => print_history_json(&session, &query, &cfg)?,
        OutputFormat::Csv => print_history_csv(&session)?,
        OutputFormat::Table => print_history_table(&session, &query, &cfg),
    }

    if let Some(target) = export_to {
        export_session(&session, &target)?;
    }

    Ok(())
}

fn print_history_table(session: &AnalyticsSession, query: &QuerySpec, cfg: &FishsortConfig) {
    let unit = cfg.display.weight_unit;
    println!("{}", "Production History".bold().cyan());
    println!("  {}", query.describe().dimmed());
    println!("{}", "=".repeat(60));

    let Some(view) = session.view().filter(|v| !v.is_empty()) else {
        println!("{}", "No records found for this range.".yellow());
        return;
    };

    println!(
        "  {} {}",
        "Records:     ".bold(),
        format_grouped(view.stats.count as i64)
    );
    println!(
        "  {} {}",
        "Total weight:".bold(),
        format_weight(view.stats.total_weight, unit)
    );
    println!(
        "  {} {}",
        "Avg weight:  ".bold(),
        format_weight(view.stats.avg_weight, unit)
    );
    if let (Some(first), Some(last)) = (view.trend.first(), view.trend.last()) {
        println!("  {} {} → {}", "Span:        ".bold(), first.label, last.label);
    }
    println!();

    print_fish_averages(session, view, unit);

    if let Some(hist) = &view.histogram {
        print_histogram(hist, view, unit);
    }

    if let Some(table) = session.table(cfg.display.table_rows) {
        print_record_table(&table);
    }
}

fn print_fish_averages(session: &AnalyticsSession, view: &HistoryView, unit: WeightUnit) {
    println!("{}", "Average Weight by Fish Type".bold().cyan());
    for (code, avg) in &view.fish_averages {
        let name = session.fish_name(code).unwrap_or_else(|| "--".to_string());
        println!(
            "  {:<6} {:<24} {:>12}",
            if code.is_empty() { "--" } else { code.as_str() },
            truncate(&name, 24),
            format_weight(*avg, unit)
        );
    }
    println!();
}

/// Width of the longest histogram bar, in terminal cells.
const BAR_WIDTH: usize = 40;

fn print_histogram(hist: &Histogram, view: &HistoryView, unit: WeightUnit) {
    println!("{}", "Weight Distribution".bold().cyan());

    // The mean marker goes on the bin row its value falls in; the overlay
    // ratio spans the full bin axis.
    let mean_row = view.mean_ratio().map(|ratio| {
        let x = overlay_x(ratio, 0.0, BIN_COUNT as f64);
        (x.floor() as usize).min(BIN_COUNT - 1)
    });

    let peak = hist.peak().max(1);
    for (i, bin) in hist.bins.iter().enumerate() {
        let len = bin.count * BAR_WIDTH / peak;
        let bar = "█".repeat(len);
        let marker = if mean_row == Some(i) {
            format!(" ◀ avg {}", format_weight(view.stats.avg_weight, unit))
                .red()
                .to_string()
        } else {
            String::new()
        };
        println!(
            "  {:>13} │{:<width$} {:>5}{}",
            bin.range_label,
            bar.blue(),
            bin.count,
            marker,
            width = BAR_WIDTH
        );
    }
    println!();
}

fn print_record_table(table: &TableView) {
    println!("{}", "Records".bold().cyan());
    println!(
        "  {:<20} {:<6} {:<24} {:>8} {:>8}",
        "Time", "Code", "Name", "Weight", "Fish avg"
    );
    println!("  {}", "-".repeat(70));

    for (i, row) in table.rows.iter().enumerate() {
        let line = format!(
            "  {:<20} {:<6} {:<24} {:>8} {:>8}",
            row.time,
            row.code,
            truncate(&row.name, 24),
            row.weight,
            row.fish_avg
        );
        if i % 2 == 0 {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }

    if table.is_truncated() {
        println!(
            "  {}",
            format!(
                "… showing first {} of {} records",
                table.rows.len(),
                format_grouped(table.total as i64)
            )
            .dimmed()
        );
    }
}

fn print_history_json(
    session: &AnalyticsSession,
    query: &QuerySpec,
    cfg: &FishsortConfig,
) -> Result<()> {
    let value = serde_json::json!({
        "query": query,
        "weight_unit": cfg.display.weight_unit,
        "view": session.view(),
        "mean_ratio": session.view().and_then(HistoryView::mean_ratio),
        "table": session.table(cfg.display.table_rows),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_history_csv(session: &AnalyticsSession) -> Result<()> {
    match session.export_csv() {
        Ok(bytes) => {
            print!("{}", String::from_utf8_lossy(&bytes));
            Ok(())
        }
        Err(HistoryError::NoData) => {
            eprintln!("{}", "No data to export.".yellow());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

// ---------------------------------------------------------------------------
// fishsort export
// ---------------------------------------------------------------------------

/// Query history and write it straight to CSV.
pub fn run_export(args: &QueryArgs, target: ExportTarget) -> Result<()> {
    let cfg = config::load();
    let client = BackendClient::from_config(&cfg.backend);
    let mut session = AnalyticsSession::with_unit(cfg.display.weight_unit);
    session.refresh_fish_types(&client);

    session
        .run_query(&client, &args.to_query())
        .context("history query failed")?;

    export_session(&session, &target)
}

/// Export the session's current result set. An empty result set is
/// reported, not treated as a failure.
fn export_session(session: &AnalyticsSession, target: &ExportTarget) -> Result<()> {
    let bytes = match session.export_csv() {
        Ok(bytes) => bytes,
        Err(HistoryError::NoData) => {
            println!("{}", "No data to export.".yellow());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let path = match target {
        ExportTarget::File(path) => {
            export::write_to_path(&bytes, path)?;
            path.clone()
        }
        ExportTarget::Dir(dir) => export::write_to_dir(&bytes, dir, Local::now().date_naive())?,
    };

    let rows = session.view().map(|v| v.records.len()).unwrap_or(0);
    info!(path = %path.display(), rows, "exported history CSV");
    println!(
        "{} Exported {} records to {}",
        "✓".green().bold(),
        format_grouped(rows as i64),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// fishsort types
// ---------------------------------------------------------------------------

/// List the fish-type mapping.
pub fn run_types(format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let client = BackendClient::from_config(&cfg.backend);
    let types = client.fish_types().context("failed to load fish types")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&types)?),
        OutputFormat::Csv => write_types_csv(&types, io::stdout())?,
        OutputFormat::Table => print_types_table(&types),
    }
    Ok(())
}

fn print_types_table(types: &[FishType]) {
    println!("{}", "Fish Types".bold().cyan());
    println!("{}", "=".repeat(40));
    if types.is_empty() {
        println!("{}", "No fish types defined.".yellow());
        return;
    }
    for t in types {
        println!("  {:<6} {}", t.code.bold(), t.name);
    }
}

fn write_types_csv<W: io::Write>(types: &[FishType], out: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for t in types {
        writer.serialize(t)?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// fishsort mix
// ---------------------------------------------------------------------------

/// Show the backend's production-mix summary.
pub fn run_mix(format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let client = BackendClient::from_config(&cfg.backend);
    let mix = client
        .production_mix()
        .context("failed to load production mix")?;

    match format {
        OutputFormat::Json => print_mix_json(&mix)?,
        OutputFormat::Csv => write_mix_csv(&mix, io::stdout())?,
        OutputFormat::Table => print_mix_table(&mix),
    }
    Ok(())
}

fn print_mix_table(mix: &ProductionMix) {
    println!("{}", "Production Mix".bold().cyan());
    println!("{}", "=".repeat(50));
    let shares = mix.shares();
    if shares.is_empty() {
        println!("{}", "No production recorded.".yellow());
        return;
    }
    for share in shares {
        let bar = "■".repeat((share.pct / 100.0 * 30.0).round() as usize);
        println!(
            "  {:<24} {:>8} {:>6.1}% {}",
            truncate(&share.label, 24),
            format_grouped(share.value.round() as i64),
            share.pct,
            bar.green()
        );
    }
}

fn print_mix_json(mix: &ProductionMix) -> Result<()> {
    let value = serde_json::json!({
        "total": mix.total(),
        "shares": mix.shares(),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn write_mix_csv<W: io::Write>(mix: &ProductionMix, out: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["label", "value", "pct"])?;
    for s in mix.shares() {
        writer.write_record([s.label, s.value.to_string(), format!("{:.1}", s.pct)])?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// fishsort watch
// ---------------------------------------------------------------------------

/// Follow the live feed, printing every change. Runs until interrupted.
pub fn run_watch() -> Result<()> {
    let cfg = config::load();
    let client = BackendClient::from_config(&cfg.backend);
    let mut session = AnalyticsSession::with_unit(cfg.display.weight_unit);
    session.refresh_fish_types(&client);

    let url = live::ws_url(client.base_url(), &cfg.backend.ws_path);
    let reconnect = Duration::from_secs(cfg.live.reconnect_secs);
    let unit = cfg.display.weight_unit;

    println!("{} {}", "Watching".bold().cyan(), url.dimmed());
    println!("Press Ctrl+C to stop.\n");

    let mut was_online = None;
    live::watch(&url, reconnect, |state| {
        if was_online != Some(state.online) {
            print_connection(state, cfg.live.reconnect_secs);
            was_online = Some(state.online);
        } else if state.online {
            print_live_line(state, &session, unit);
        }
        ControlFlow::Continue(())
    });

    Ok(())
}

fn print_connection(state: &LiveState, reconnect_secs: u64) {
    if state.online {
        println!("{} {}", "●".green().bold(), "ONLINE".green());
    } else {
        println!(
            "{} {} {}",
            "●".red().bold(),
            "OFFLINE".red(),
            format!("(retrying every {reconnect_secs}s)").dimmed()
        );
    }
}

fn print_live_line(state: &LiveState, session: &AnalyticsSession, unit: WeightUnit) {
    let status = state.status.as_deref().unwrap_or("----");
    let code = state.fish_code.as_deref().unwrap_or("----");
    let name = state
        .fish_code
        .as_deref()
        .and_then(|c| session.fish_name(c))
        .unwrap_or_else(|| code.to_string());
    let weight = state
        .weight
        .map(|w| format!("{:.2} {}", w, unit))
        .unwrap_or_else(|| "--".to_string());

    println!(
        "  {} {:<6} {:<6} {:<24} {:>12}",
        Local::now().format("%H:%M:%S").to_string().dimmed(),
        colorize_status(status),
        code,
        truncate(&name, 24),
        weight
    );
}

// ---------------------------------------------------------------------------
// fishsort health
// ---------------------------------------------------------------------------

/// Check config files and backend reachability.
pub fn run_health() -> Result<()> {
    println!("{}", "fishsort Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();

    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.fishsort/config.toml found"
        } else {
            "not found (run `fishsort config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".fishsort.toml found"
        } else {
            "none (optional)"
        },
    );

    let client = BackendClient::from_config(&cfg.backend);
    let backend_ok = client.is_healthy();
    print_health_item(
        "Backend",
        backend_ok,
        &if backend_ok {
            format!("reachable at {}", client.base_url())
        } else {
            format!("not reachable at {}", client.base_url())
        },
    );

    if backend_ok {
        match client.fish_types() {
            Ok(types) => print_health_item("Fish types", true, &format!("{} defined", types.len())),
            Err(e) => print_health_item("Fish types", false, &e.to_string()),
        }
    }

    print_health_item(
        "Live feed",
        true,
        &live::ws_url(client.base_url(), &cfg.backend.ws_path),
    );
    print_health_item(
        "Weight unit",
        true,
        &cfg.display.weight_unit.to_string(),
    );

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<16} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// fishsort config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective fishsort Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.fishsort/config.toml");
    print_source(project_exists, ".fishsort.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "FISHSORT_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(exists: bool, label: &str) {
    if exists {
        println!("  {} {}", "✓".green(), label.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{label} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.fishsort/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format an integer with comma separators.
pub fn format_grouped(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut result = String::new();
    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    if n < 0 {
        result.push('-');
    }
    result.chars().rev().collect()
}

/// Weight for display: grouped whole grams, or kilograms to two decimals.
pub fn format_weight(weight: f64, unit: WeightUnit) -> String {
    match unit {
        WeightUnit::G => format!("{} {}", format_grouped(weight.round() as i64), unit),
        WeightUnit::Kg => unit.format(weight),
    }
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// Colorize a machine status.
fn colorize_status(status: &str) -> colored::ColoredString {
    match status {
        "RUN" => status.green(),
        "IDLE" => status.yellow(),
        "ALARM" => status.red().bold(),
        _ => status.normal(),
    }
}

/// Resolve the export target from `--output` / `--out-dir`.
pub fn export_target(output: Option<PathBuf>, out_dir: Option<PathBuf>) -> ExportTarget {
    match (output, out_dir) {
        (Some(path), _) => ExportTarget::File(path),
        (None, Some(dir)) => ExportTarget::Dir(dir),
        (None, None) => ExportTarget::Dir(Path::new(".").to_path_buf()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
