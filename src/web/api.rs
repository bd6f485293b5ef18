//! JSON API handlers for the web dashboard.
//!
//! Each handler corresponds to an API endpoint and returns a
//! `Response<Cursor<Vec<u8>>>` with JSON content.

use std::io::Cursor;

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use tiny_http::{Response, StatusCode};
use url::form_urlencoded;

use crate::backend::client::MixShare;
use crate::config::{FishsortConfig, WeightUnit};
use crate::error::HistoryError;
use crate::history::export;
use crate::history::query::{self, QuerySpec};
use crate::history::session::HistoryView;
use crate::history::table::TableView;

use super::{Dashboard, content_type_json, csv_attachment, json_error};

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

/// Analytics API response: the installed view plus display helpers.
#[derive(Serialize)]
struct AnalyticsResponse<'a> {
    query: &'a QuerySpec,
    revision: u64,
    weight_unit: WeightUnit,
    view: &'a HistoryView,
    /// Per-fish averages keyed by code, with names resolved.
    fish_averages: Vec<FishAverageResponse>,
    mean_ratio: Option<f64>,
    table: Option<TableView>,
}

#[derive(Serialize)]
struct FishAverageResponse {
    code: String,
    name: Option<String>,
    avg_weight: f64,
}

/// Production-mix API response.
#[derive(Serialize)]
struct MixResponse {
    total: f64,
    shares: Vec<MixShare>,
}

/// Config API response: the full config as a JSON value plus the raw TOML.
#[derive(Serialize)]
struct ConfigResponse<'a> {
    config: &'a FishsortConfig,
    toml_text: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON success response.
fn json_response<T: Serialize>(data: &T) -> Result<Response<Cursor<Vec<u8>>>> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(200)))
}

/// Extract a form-encoded query-string parameter. Present-but-empty
/// yields `Some("")`.
fn query_param(url: &str, name: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `GET /api/analytics?start=&end=&fish_code=`: run the pipeline.
///
/// A missing `start`/`end` falls back to the default 24-hour window; an
/// empty one removes that bound.
pub fn get_analytics(dashboard: &Dashboard, url: &str) -> Result<Response<Cursor<Vec<u8>>>> {
    let (default_start, default_end) = query::default_range();
    let start = query_param(url, "start").unwrap_or(default_start);
    let end = query_param(url, "end").unwrap_or(default_end);
    let fish_code = query_param(url, "fish_code");
    let spec = QuerySpec::build(Some(&start), Some(&end), fish_code.as_deref());

    let mut session = dashboard
        .session
        .lock()
        .map_err(|_| anyhow::anyhow!("analytics session lock poisoned"))?;
    session.run_query(&dashboard.client, &spec)?;

    let view = session
        .view()
        .context("analytics session has no view after query")?;
    let fish_averages = view
        .fish_averages
        .iter()
        .map(|(code, avg)| FishAverageResponse {
            code: code.clone(),
            name: session.fish_name(code),
            avg_weight: *avg,
        })
        .collect();

    let resp = AnalyticsResponse {
        query: &spec,
        revision: session.revision(),
        weight_unit: dashboard.config.display.weight_unit,
        view,
        fish_averages,
        mean_ratio: view.mean_ratio(),
        table: session.table(dashboard.config.display.table_rows),
    };

    json_response(&resp)
}

/// `GET /api/export.csv`: CSV of the current session's result set.
pub fn get_export(dashboard: &Dashboard) -> Result<Response<Cursor<Vec<u8>>>> {
    let session = dashboard
        .session
        .lock()
        .map_err(|_| anyhow::anyhow!("analytics session lock poisoned"))?;

    let bytes = match session.export_csv() {
        Ok(bytes) => bytes,
        Err(HistoryError::NoData) => return Ok(json_error(404, "no data to export")),
        Err(e) => return Err(e.into()),
    };

    let [content_type, disposition] =
        csv_attachment(&export::file_name(Local::now().date_naive()));
    Ok(Response::from_data(bytes)
        .with_header(content_type)
        .with_header(disposition)
        .with_status_code(StatusCode(200)))
}

/// `GET /api/fish-types`: fish-type mapping from the backend.
///
/// Also refreshes the session's name lookup.
pub fn get_fish_types(dashboard: &Dashboard) -> Result<Response<Cursor<Vec<u8>>>> {
    let types = dashboard.client.fish_types()?;
    if let Ok(mut session) = dashboard.session.lock() {
        session.set_fish_types(&types);
    }
    json_response(&types)
}

/// `GET /api/mix`: production-mix summary from the backend.
pub fn get_mix(dashboard: &Dashboard) -> Result<Response<Cursor<Vec<u8>>>> {
    let mix = dashboard.client.production_mix()?;
    json_response(&MixResponse {
        total: mix.total(),
        shares: mix.shares(),
    })
}

/// `GET /api/config`: effective configuration the dashboard runs with.
pub fn get_config(dashboard: &Dashboard) -> Result<Response<Cursor<Vec<u8>>>> {
    let toml_text = toml::to_string_pretty(&dashboard.config)
        .context("failed to serialize effective config")?;
    json_response(&ConfigResponse {
        config: &dashboard.config,
        toml_text,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
