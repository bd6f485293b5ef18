/// Live tag feed over WebSocket.
///
/// The backend broadcasts JSON messages carrying any subset of `status`,
/// `weight` and `fish_code` whenever a PLC tag changes. [`watch`] keeps a
/// [`LiveState`] with the latest value of each and reconnects forever with a
/// fixed delay when the connection drops. The only visible sign of trouble
/// is the state going offline.
use std::ops::ControlFlow;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tungstenite::Message;

use crate::history::record::lenient_weight;

/// One broadcast message. Absent fields leave the state untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LiveUpdate {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_weight")]
    pub weight: Option<f64>,
    #[serde(default)]
    pub fish_code: Option<String>,
}

/// Latest known line state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LiveState {
    pub online: bool,
    pub status: Option<String>,
    pub weight: Option<f64>,
    pub fish_code: Option<String>,
    /// Messages applied since start.
    pub updates: u64,
}

impl LiveState {
    /// Merge the fields present in `update`.
    pub fn apply(&mut self, update: &LiveUpdate) {
        if let Some(status) = update.status.as_ref().filter(|s| !s.is_empty()) {
            self.status = Some(status.clone());
        }
        if let Some(weight) = update.weight {
            self.weight = Some(weight);
        }
        if let Some(code) = update.fish_code.as_ref().filter(|c| !c.is_empty()) {
            self.fish_code = Some(code.clone());
        }
        self.updates += 1;
    }
}

/// WebSocket URL for `path` on the backend host (`http` → `ws`,
/// `https` → `wss`).
pub fn ws_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let host = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if base.starts_with("ws://") || base.starts_with("wss://") {
        base.to_string()
    } else {
        format!("ws://{base}")
    };

    if path.starts_with('/') {
        format!("{host}{path}")
    } else {
        format!("{host}/{path}")
    }
}

/// Follow the live feed at `url` until `on_change` breaks.
///
/// `on_change` sees the state after every connect, applied message and
/// disconnect. Malformed messages are logged and skipped. After a
/// disconnect or failed connect the loop sleeps `reconnect` and tries
/// again, with no backoff growth and no retry limit.
pub fn watch<F>(url: &str, reconnect: Duration, mut on_change: F) -> LiveState
where
    F: FnMut(&LiveState) -> ControlFlow<()>,
{
    let mut state = LiveState::default();

    loop {
        match tungstenite::connect(url) {
            Ok((mut socket, _)) => {
                info!(%url, "live feed connected");
                state.online = true;
                if on_change(&state).is_break() {
                    let _ = socket.close(None);
                    return state;
                }

                loop {
                    match socket.read() {
                        Ok(Message::Text(text)) => match serde_json::from_str::<LiveUpdate>(&text) {
                            Ok(update) => {
                                state.apply(&update);
                                if on_change(&state).is_break() {
                                    let _ = socket.close(None);
                                    return state;
                                }
                            }
                            Err(e) => warn!(error = %e, "skipping malformed live message"),
                        },
                        Ok(Message::Close(_)) => break,
                        Ok(_) => {}
                        Err(e) => {
                            warn!(error = %e, "live feed read failed");
                            break;
                        }
                    }
                }
            }
            Err(e) => warn!(%url, error = %e, "live feed connect failed"),
        }

        state.online = false;
        if on_change(&state).is_break() {
            return state;
        }
        warn!(delay_secs = reconnect.as_secs_f64(), "live feed offline, reconnecting");
        thread::sleep(reconnect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_swaps_scheme() {
        assert_eq!(ws_url("http://10.0.0.5:8000", "/ws"), "ws://10.0.0.5:8000/ws");
        assert_eq!(ws_url("https://line.local/", "/ws/tags"), "wss://line.local/ws/tags");
        assert_eq!(ws_url("10.0.0.5:8000", "ws"), "ws://10.0.0.5:8000/ws");
        assert_eq!(ws_url("ws://10.0.0.5:8000", "/ws"), "ws://10.0.0.5:8000/ws");
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let mut state = LiveState::default();
        state.apply(&serde_json::from_str(r#"{"status":"RUN","weight":1.25,"fish_code":"F001"}"#).unwrap());
        state.apply(&serde_json::from_str(r#"{"weight":"2.5"}"#).unwrap());

        assert_eq!(state.status.as_deref(), Some("RUN"));
        assert_eq!(state.weight, Some(2.5));
        assert_eq!(state.fish_code.as_deref(), Some("F001"));
        assert_eq!(state.updates, 2);
    }

    #[test]
    fn empty_message_changes_nothing_but_the_counter() {
        let mut state = LiveState::default();
        state.apply(&serde_json::from_str(r#"{"status":"IDLE"}"#).unwrap());
        state.apply(&serde_json::from_str("{}").unwrap());
        assert_eq!(state.status.as_deref(), Some("IDLE"));
        assert_eq!(state.weight, None);
        assert_eq!(state.updates, 2);
    }

    #[test]
    fn empty_strings_do_not_clear_known_values() {
        let mut state = LiveState::default();
        state.apply(&serde_json::from_str(r#"{"status":"RUN","fish_code":"F001"}"#).unwrap());
        state.apply(&serde_json::from_str(r#"{"status":"","fish_code":""}"#).unwrap());
        assert_eq!(state.status.as_deref(), Some("RUN"));
        assert_eq!(state.fish_code.as_deref(), Some("F001"));
    }
}
