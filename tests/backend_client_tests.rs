//! Backend client tests against a local fake backend.
mod common;

use common::{FakeBackend, fake_backend};
use fishsort::backend::BackendClient;
use fishsort::config::schema::BackendConfig;
use fishsort::error::BackendError;
use fishsort::history::{AnalyticsSession, QuerySpec};

fn client_for(fake: &FakeBackend) -> BackendClient {
    BackendClient::from_config(&BackendConfig {
        base_url: fake.base_url.clone(),
        timeout_ms: 5_000,
        ws_path: "/ws".to_string(),
    })
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn history_sends_query_parameters() {
    let fake = fake_backend(vec![(200, "[]")]);
    let client = client_for(&fake);

    let query = QuerySpec::build(
        Some("2024-01-01T08:00"),
        Some("2024-01-02T08:00"),
        Some("F001"),
    );
    let records = client.history(&query).unwrap();
    assert!(records.is_empty());

    let url = fake.seen.recv().unwrap();
    assert!(url.starts_with("/api/history?"), "{url}");
    assert!(url.contains("start_time=2024-01-01+08%3A00"), "{url}");
    assert!(url.contains("end_time=2024-01-02+08%3A00"), "{url}");
    assert!(url.contains("fish_code=F001"), "{url}");
    assert!(url.contains("limit=2000"), "{url}");
}

#[test]
fn history_omits_absent_filters() {
    let fake = fake_backend(vec![(200, "[]")]);
    let client = client_for(&fake);

    client.history(&QuerySpec::build(None, None, Some(""))).unwrap();

    let url = fake.seen.recv().unwrap();
    assert_eq!(url, "/api/history?limit=2000");
}

#[test]
fn history_decodes_lenient_records() {
    let fake = fake_backend(vec![(
        200,
        r#"[
            {"timestamp":"2024-01-01T10:00:00","fish_code":"F001","weight":"1200.5","status":"OK"},
            {"timestamp":null,"fish_code":null,"weight":"n/a"},
            {"fish_code":"F002","weight":900}
        ]"#,
    )]);
    let client = client_for(&fake);

    let records = client.history(&QuerySpec::build(None, None, None)).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].weight, Some(1200.5));
    assert_eq!(records[1].weight, None);
    assert_eq!(records[1].fish_code, "");
    assert_eq!(records[2].timestamp, None);
    assert_eq!(records[2].weight, Some(900.0));
}

#[test]
fn fish_types_are_decoded() {
    let fake = fake_backend(vec![(
        200,
        r#"[{"code":"F001","name":"白鯧"},{"code":"F002","name":"Grouper"}]"#,
    )]);
    let client = client_for(&fake);

    let types = client.fish_types().unwrap();
    assert_eq!(types.len(), 2);
    assert_eq!(types[0].code, "F001");
    assert_eq!(types[0].name, "白鯧");
    assert_eq!(fake.seen.recv().unwrap(), "/api/fish-types");
}

#[test]
fn production_mix_is_decoded() {
    let fake = fake_backend(vec![(200, r#"{"labels":["F001","F002"],"data":[30,10]}"#)]);
    let client = client_for(&fake);

    let mix = client.production_mix().unwrap();
    assert_eq!(mix.total(), 40.0);
    let shares = mix.shares();
    assert_eq!(shares[0].pct, 75.0);
    assert_eq!(shares[1].pct, 25.0);
    assert_eq!(fake.seen.recv().unwrap(), "/api/history/stats");
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn non_success_status_maps_to_status_error() {
    let fake = fake_backend(vec![(500, r#"{"detail":"db down"}"#)]);
    let client = client_for(&fake);

    let err = client.history(&QuerySpec::build(None, None, None)).unwrap_err();
    match err {
        BackendError::Status { endpoint, status } => {
            assert_eq!(endpoint, "/api/history");
            assert_eq!(status, 500);
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[test]
fn malformed_body_maps_to_decode_error() {
    let fake = fake_backend(vec![(200, r#"{"not":"a list"}"#)]);
    let client = client_for(&fake);

    let err = client.fish_types().unwrap_err();
    assert!(matches!(err, BackendError::Decode { .. }), "{err:?}");
}

#[test]
fn unreachable_backend_maps_to_transport_error() {
    let client = BackendClient::from_config(&BackendConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_ms: 500,
        ws_path: "/ws".to_string(),
    });

    let err = client.fish_types().unwrap_err();
    assert!(matches!(err, BackendError::Transport { .. }), "{err:?}");
    assert!(!client.is_healthy());
}

// ---------------------------------------------------------------------------
// Session over the client
// ---------------------------------------------------------------------------

#[test]
fn session_resolves_names_after_query() {
    let fake = fake_backend(vec![
        (200, r#"[{"code":"F001","name":"Pomfret"}]"#),
        (
            200,
            r#"[
                {"timestamp":"2024-01-01 10:00:00","fish_code":"F001","weight":1000},
                {"timestamp":"2024-01-01 09:00:00","fish_code":"F001","weight":1200},
                {"timestamp":"2024-01-01 08:00:00","fish_code":"F009","weight":800}
            ]"#,
        ),
    ]);
    let client = client_for(&fake);

    let mut session = AnalyticsSession::new();
    session.refresh_fish_types(&client);
    let view = session
        .run_query(&client, &QuerySpec::build(None, None, None))
        .unwrap();
    assert_eq!(view.stats.count, 3);
    assert_eq!(view.stats.total_weight, 3000.0);
    assert_eq!(view.fish_averages.get("F001"), Some(&1100.0));

    assert_eq!(session.fish_name("F001").as_deref(), Some("Pomfret"));
    assert_eq!(session.fish_name("F009"), None);

    let csv = String::from_utf8(session.export_csv().unwrap()).unwrap();
    assert!(csv.contains("\"F001\",\"Pomfret\",\"1000\""), "{csv}");
    assert!(csv.contains("\"F009\",\"\",\"800\""), "{csv}");
}

#[test]
fn failed_query_leaves_session_empty() {
    let fake = fake_backend(vec![
        (200, r#"[{"fish_code":"F001","weight":1000}]"#),
        (503, "{}"),
    ]);
    let client = client_for(&fake);
    let mut session = AnalyticsSession::new();

    session
        .run_query(&client, &QuerySpec::build(None, None, None))
        .unwrap();
    assert!(session.has_data());

    assert!(session
        .run_query(&client, &QuerySpec::build(None, None, None))
        .is_err());
    assert!(!session.has_data());
}
