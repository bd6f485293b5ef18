//! Embedded web dashboard for fishsort.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page history dashboard (stats, histogram, record list)
//! - JSON API endpoints backed by a shared [`AnalyticsSession`]
//!
//! Launched via `fishsort web` (default: `http://127.0.0.1:9750`).

mod api;
mod frontend;

use std::io::Cursor;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing::{info, warn};

use crate::backend::client::BackendClient;
use crate::config::FishsortConfig;
use crate::error::BackendError;
use crate::history::session::AnalyticsSession;

/// State shared by every request.
///
/// The session is replaced wholesale by each analytics query, so whichever
/// query completes last is what the export endpoint sees.
pub struct Dashboard {
    pub(crate) client: BackendClient,
    pub(crate) config: FishsortConfig,
    pub(crate) session: Mutex<AnalyticsSession>,
}

impl Dashboard {
    pub fn new(config: FishsortConfig) -> Self {
        let client = BackendClient::from_config(&config.backend);
        let mut session = AnalyticsSession::with_unit(config.display.weight_unit);
        session.refresh_fish_types(&client);
        Self {
            client,
            config,
            session: Mutex::new(session),
        }
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the web dashboard server on the given address.
///
/// Blocks the current thread. Handles requests sequentially. Errors are
/// reported per request without stopping the server.
pub fn serve(addr: &str, config: FishsortConfig) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    let dashboard = Dashboard::new(config);

    println!("fishsort dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    let url = format!("http://{addr}");
    if let Err(e) = open_browser(&url) {
        warn!(error = %e, "could not open browser");
    }

    for request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let resp = match dispatch(&dashboard, &method, &url) {
            Ok(resp) => resp,
            Err(e) => error_response(&e),
        };
        let status = resp.status_code().0;
        if let Err(e) = request.respond(resp) {
            warn!(error = %e, "failed to send response");
        }

        info!(%method, %url, status, "request");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
pub fn dispatch(
    dashboard: &Dashboard,
    method: &Method,
    url: &str,
) -> Result<Response<Cursor<Vec<u8>>>> {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        // Frontend
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(serve_frontend()),

        // API: History
        (&Method::Get, "/api/analytics") => api::get_analytics(dashboard, url),
        (&Method::Get, "/api/export.csv") => api::get_export(dashboard),

        // API: Backend passthrough
        (&Method::Get, "/api/fish-types") => api::get_fish_types(dashboard),
        (&Method::Get, "/api/mix") => api::get_mix(dashboard),

        // API: Configuration
        (&Method::Get, "/api/config") => api::get_config(dashboard),

        // 404
        _ => Ok(json_error(404, "not found")),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Serve the embedded single-page frontend.
fn serve_frontend() -> Response<Cursor<Vec<u8>>> {
    Response::from_data(frontend::INDEX_HTML.as_bytes().to_vec())
        .with_header(content_type_html())
        .with_status_code(StatusCode(200))
}

/// Map a handler error to a JSON error response. Backend failures are
/// surfaced as a bad gateway.
fn error_response(err: &anyhow::Error) -> Response<Cursor<Vec<u8>>> {
    let status = err
        .downcast_ref::<BackendError>()
        .map(BackendError::proxy_status)
        .unwrap_or(500);
    json_error(status, &format!("{err:#}"))
}

/// JSON `{"error": ...}` response with the given status.
pub(crate) fn json_error(status: u16, message: &str) -> Response<Cursor<Vec<u8>>> {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status))
}

/// JSON content type header.
pub(crate) fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8").unwrap()
}

/// CSV download headers.
pub(crate) fn csv_attachment(file_name: &str) -> [Header; 2] {
    [
        Header::from_bytes("Content-Type", "text/csv; charset=utf-8").unwrap(),
        Header::from_bytes(
            "Content-Disposition",
            format!("attachment; filename=\"{file_name}\""),
        )
        .unwrap(),
    ]
}

/// HTML content type header.
fn content_type_html() -> Header {
    Header::from_bytes("Content-Type", "text/html; charset=utf-8").unwrap()
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_dashboard() -> Dashboard {
        let mut config = FishsortConfig::default();
        // Nothing listens on port 9 (discard) locally.
        config.backend.base_url = "http://127.0.0.1:9".to_string();
        config.backend.timeout_ms = 200;
        Dashboard {
            client: BackendClient::from_config(&config.backend),
            config,
            session: Mutex::new(AnalyticsSession::new()),
        }
    }

    #[test]
    fn unknown_route_is_not_found() {
        let dash = offline_dashboard();
        let resp = dispatch(&dash, &Method::Get, "/nope").unwrap();
        assert_eq!(resp.status_code().0, 404);
    }

    #[test]
    fn export_without_data_is_not_found() {
        let dash = offline_dashboard();
        let resp = dispatch(&dash, &Method::Get, "/api/export.csv").unwrap();
        assert_eq!(resp.status_code().0, 404);
    }

    #[test]
    fn backend_failure_maps_to_bad_gateway() {
        let dash = offline_dashboard();
        let err = dispatch(&dash, &Method::Get, "/api/fish-types").err().expect("expected dispatch to fail");
        assert_eq!(error_response(&err).status_code().0, 502);
    }

    #[test]
    fn other_failures_map_to_internal_error() {
        let err = anyhow::anyhow!("boom");
        assert_eq!(error_response(&err).status_code().0, 500);
    }
}
