/// REST client for the sorting-line backend.
///
/// Uses the synchronous `ureq` HTTP client. Every call is a single attempt:
/// failures are mapped to [`BackendError`] and handed back to the caller,
/// which reports them and leaves the user free to re-run the command.
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::schema::BackendConfig;
use crate::error::{BackendError, BackendResult};
use crate::history::{QuerySpec, WeightRecord};

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A fish-type mapping: the 4-character code the PLC stores and the name
/// shown to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FishType {
    pub code: String,
    pub name: String,
}

/// Production-mix summary from `GET /api/history/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionMix {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub data: Vec<f64>,
}

/// One labelled slice of the production mix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixShare {
    pub label: String,
    pub value: f64,
    pub pct: f64,
}

impl ProductionMix {
    /// Sum of all slice values.
    pub fn total(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Pair labels with values and their share of the total.
    ///
    /// Extra values without a label (or labels without a value) are
    /// dropped. A zero total gives every slice 0%.
    pub fn shares(&self) -> Vec<MixShare> {
        let total = self.total();
        self.labels
            .iter()
            .zip(&self.data)
            .map(|(label, &value)| MixShare {
                label: label.clone(),
                value,
                pct: if total == 0.0 {
                    0.0
                } else {
                    value / total * 100.0
                },
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous backend client.
///
/// Built from [`BackendConfig`] and reused for one command invocation (or
/// for the lifetime of the dashboard server).
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    agent: ureq::Agent,
}

impl BackendClient {
    /// Build a client from the resolved config.
    pub fn from_config(config: &BackendConfig) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if config.timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.timeout_ms));
        }
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            agent: builder.build(),
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/fish-types`
    pub fn fish_types(&self) -> BackendResult<Vec<FishType>> {
        self.get_json("/api/fish-types", &[])
    }

    /// `GET /api/history` with the query's parameters.
    ///
    /// Records come back newest first.
    pub fn history(&self, query: &QuerySpec) -> BackendResult<Vec<WeightRecord>> {
        let pairs = query.query_pairs();
        let params: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (*k, v.as_str())).collect();
        self.get_json("/api/history", &params)
    }

    /// `GET /api/history/stats`
    pub fn production_mix(&self) -> BackendResult<ProductionMix> {
        self.get_json("/api/history/stats", &[])
    }

    /// `GET /api/status`: the backend's current tag snapshot.
    pub fn status(&self) -> BackendResult<serde_json::Value> {
        self.get_json("/api/status", &[])
    }

    /// Whether the backend answers its status endpoint.
    pub fn is_healthy(&self) -> bool {
        self.status().is_ok()
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> BackendResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?params, "GET");

        let mut request = self.agent.get(&url);
        for (key, value) in params {
            request = request.query(key, value);
        }

        let response = request.call().map_err(|e| {
            let err = map_ureq_error(path, e);
            error!(error = %err, "backend request failed");
            err
        })?;

        response.into_json::<T>().map_err(|e| {
            let err = BackendError::Decode {
                endpoint: path.to_string(),
                message: e.to_string(),
            };
            error!(error = %err, "backend response not understood");
            err
        })
    }
}

fn map_ureq_error(endpoint: &str, err: ureq::Error) -> BackendError {
    match err {
        ureq::Error::Status(status, _) => BackendError::Status {
            endpoint: endpoint.to_string(),
            status,
        },
        ureq::Error::Transport(t) => BackendError::Transport {
            endpoint: endpoint.to_string(),
            message: t.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_strips_trailing_slash() {
        let config = BackendConfig {
            base_url: "http://line-1:8000/".to_string(),
            ..BackendConfig::default()
        };
        let client = BackendClient::from_config(&config);
        assert_eq!(client.base_url(), "http://line-1:8000");
    }

    #[test]
    fn mix_shares_sum_to_hundred() {
        let mix = ProductionMix {
            labels: vec!["白鯧".into(), "鮭魚".into(), "鮪魚".into()],
            data: vec![120.0, 45.0, 80.0],
        };
        let shares = mix.shares();
        assert_eq!(shares.len(), 3);
        let sum: f64 = shares.iter().map(|s| s.pct).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert_eq!(shares[0].label, "白鯧");
    }

    #[test]
    fn mix_with_zero_total_has_zero_shares() {
        let mix = ProductionMix {
            labels: vec!["a".into(), "b".into()],
            data: vec![0.0, 0.0],
        };
        assert!(mix.shares().iter().all(|s| s.pct == 0.0));
    }

    #[test]
    fn unlabelled_values_still_count_toward_total() {
        let mix = ProductionMix {
            labels: vec!["a".into()],
            data: vec![5.0, 15.0],
        };
        let shares = mix.shares();
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].pct, 25.0);
    }

    #[test]
    fn fish_type_deserializes() {
        let list: Vec<FishType> =
            serde_json::from_str(r#"[{"code":"F001","name":"白鯧 (White Pomfret)"}]"#).unwrap();
        assert_eq!(list[0].code, "F001");
    }
}
