//! Typed errors for the library side of fishsort.
//!
//! Command handlers work with `anyhow::Result`; these enums are what the
//! backend client and the analytics pipeline hand back to them.

use thiserror::Error;

/// Failure talking to the sorting-line backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Connection refused, DNS failure, timeout and other transport problems.
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    /// The backend answered with a non-2xx status.
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// The body could not be decoded into the expected shape.
    #[error("could not decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// WebSocket handshake or read failure on the live feed.
    #[error("live feed error: {0}")]
    Live(String),
}

impl BackendError {
    /// HTTP status to surface when proxying this error (dashboard).
    pub fn proxy_status(&self) -> u16 {
        match self {
            Self::Status { status, .. } if *status == 404 => 404,
            _ => 502,
        }
    }
}

/// Precondition failures in the history pipeline.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// The current result set is empty.
    #[error("no data to export")]
    NoData,

    /// CSV serialisation failed.
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    /// Writing the export file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BackendResult<T> = Result<T, BackendError>;

pub type HistoryResult<T> = Result<T, HistoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_message_names_endpoint() {
        let err = BackendError::Status {
            endpoint: "/api/history".to_string(),
            status: 500,
        };
        assert_eq!(err.to_string(), "/api/history returned HTTP 500");
        assert_eq!(err.proxy_status(), 502);
    }

    #[test]
    fn not_found_is_proxied_as_not_found() {
        let err = BackendError::Status {
            endpoint: "/api/fish-types".to_string(),
            status: 404,
        };
        assert_eq!(err.proxy_status(), 404);
    }

    #[test]
    fn no_data_message() {
        assert_eq!(HistoryError::NoData.to_string(), "no data to export");
    }
}
