//! Dashboard routing tests against a local fake backend.
mod common;

use std::io::Read;

use common::fake_backend;
use fishsort::config::FishsortConfig;
use fishsort::web::{Dashboard, dispatch};
use serde_json::Value;
use tiny_http::Method;

const FISH_TYPES: &str = r#"[{"code":"F001","name":"Pomfret"}]"#;

const HISTORY: &str = r#"[
    {"timestamp":"2024-01-01 10:00:00","fish_code":"F001","weight":1000},
    {"timestamp":"2024-01-01 09:00:00","fish_code":"F001","weight":1200},
    {"timestamp":"2024-01-01 08:00:00","fish_code":"F009","weight":800}
]"#;

fn dashboard_for(base_url: &str) -> Dashboard {
    let mut config = FishsortConfig::default();
    config.backend.base_url = base_url.to_string();
    config.backend.timeout_ms = 5_000;
    Dashboard::new(config)
}

fn get(dashboard: &Dashboard, url: &str) -> (u16, Vec<u8>) {
    let resp = dispatch(dashboard, &Method::Get, url).unwrap();
    let status = resp.status_code().0;
    let mut body = Vec::new();
    resp.into_reader().read_to_end(&mut body).unwrap();
    (status, body)
}

#[test]
fn analytics_installs_result_for_export() {
    let fake = fake_backend(vec![(200, FISH_TYPES), (200, HISTORY)]);
    let dash = dashboard_for(&fake.base_url);
    assert_eq!(fake.seen.recv().unwrap(), "/api/fish-types");

    let (status, body) = get(&dash, "/api/analytics?start=&end=");
    assert_eq!(status, 200);

    let url = fake.seen.recv().unwrap();
    assert!(url.starts_with("/api/history?"), "{url}");
    assert!(!url.contains("start_time"), "{url}");
    assert!(!url.contains("end_time"), "{url}");

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["revision"], 1);
    assert_eq!(json["view"]["stats"]["count"], 3);
    assert_eq!(json["view"]["stats"]["total_weight"], 3000.0);
    assert_eq!(json["view"]["stats"]["avg_weight"], 1000.0);

    let bins = json["view"]["histogram"]["bins"].as_array().unwrap();
    assert_eq!(bins.len(), 15);
    assert_eq!(bins[0]["range_label"], "800-827");
    assert_eq!(bins[14]["range_label"], "1173-1200");

    let rows = json["table"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["name"], "Pomfret");
    assert_eq!(rows[0]["weight"], "1000");
    assert_eq!(rows[0]["fish_avg"], "1100");

    let (status, body) = get(&dash, "/api/export.csv");
    assert_eq!(status, 200);
    assert!(body.starts_with(b"\xEF\xBB\xBF"));
    let text = String::from_utf8(body).unwrap();
    assert_eq!(text.lines().count(), 4);
    assert!(text.contains(r#""2024-01-01 09:00:00","F001","Pomfret","1200""#));
}

#[test]
fn failed_analytics_leaves_nothing_to_export() {
    let fake = fake_backend(vec![
        (200, FISH_TYPES),
        (200, HISTORY),
        (500, r#"{"detail":"db down"}"#),
    ]);
    let dash = dashboard_for(&fake.base_url);

    let (status, _) = get(&dash, "/api/analytics?start=&end=");
    assert_eq!(status, 200);
    assert!(dispatch(&dash, &Method::Get, "/api/analytics?start=&end=").is_err());

    let (status, _) = get(&dash, "/api/export.csv");
    assert_eq!(status, 404);
}
