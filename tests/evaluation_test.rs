//! Self-evaluation against a live server
//!
//! Binds the real router on an ephemeral loopback port and lets the
//! harness probe it over HTTP, including a target that never answers
//! within the probe timeout and a server that is not listening at all.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{routing::get, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use user_insights::api::{create_router, AppState};
use user_insights::evaluation::EvaluationHarness;
use user_insights::{ingest_slice, Config, HttpProbe, RecordStore};

const PROBE_TIMEOUT: Duration = Duration::from_millis(300);

async fn stall() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "too late"
}

fn sample_records() -> String {
    json!([{
        "id": "0b6c5a1e-3f4d-4b8a-9c2e-1d7f6a5b4c3d",
        "name": "Ana",
        "age": 29,
        "score": 960,
        "active": true,
        "country": "BR",
        "team": { "name": "Core", "leader": true, "projects": [] },
        "logs": [{ "date": "2024-05-01", "action": "login" }]
    }])
    .to_string()
}

/// Serve the API plus a `/stall` route; returns the bound address
async fn spawn_server(targets: &[&str]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = Config::default();
    config.evaluation.base_url = Some(format!("http://{addr}"));
    config.evaluation.timeout_ms = PROBE_TIMEOUT.as_millis() as u64;
    config.evaluation.targets = targets.iter().map(|t| t.to_string()).collect();

    let state = Arc::new(AppState::new(&config).unwrap());
    ingest_slice(&state.store, sample_records())
        .await
        .unwrap();

    let app = create_router(state).merge(Router::new().route("/stall", get(stall)));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_evaluation_isolates_stalled_target() {
    let addr = spawn_server(&[
        "/superusers",
        "/top-countries",
        "/stall",
        "/active-users-per-day",
    ])
    .await;

    let started = Instant::now();
    let body: Value = reqwest::get(format!("http://{addr}/evaluation"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // one stalled probe costs one timeout, not the stall duration
    assert!(started.elapsed() < Duration::from_secs(4));

    assert_eq!(body["status"], 200);
    let tested = body["body"]["tested_endpoints"].as_object().unwrap();
    let errors = body["body"]["endpoints_with_errors"].as_object().unwrap();

    assert_eq!(tested.len(), 3);
    assert_eq!(errors.len(), 1);
    assert!(errors.contains_key("/stall"));
    assert!(!tested.contains_key("/stall"));

    for target in ["/superusers", "/top-countries", "/active-users-per-day"] {
        assert_eq!(tested[target]["status"], 200, "{target}");
        assert_eq!(tested[target]["valid_response"], true, "{target}");
    }
    assert!(errors["/stall"]["error"].as_str().unwrap().contains("/stall"));
    assert!(!errors["/stall"]["detailed_error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_evaluation_records_error_statuses_as_completed() {
    let addr = spawn_server(&["/superusers", "/top-countries?limit=0"]).await;

    let body: Value = reqwest::get(format!("http://{addr}/evaluation"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let tested = &body["body"]["tested_endpoints"];
    assert_eq!(tested["/top-countries?limit=0"]["status"], 400);
    assert_eq!(tested["/top-countries?limit=0"]["valid_response"], true);
    assert_eq!(body["body"]["endpoints_with_errors"], json!({}));
}

#[tokio::test]
async fn test_unreachable_server_fills_error_map() {
    // Grab a free port and release it so nothing is listening there
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = RecordStore::new();
    ingest_slice(&store, sample_records()).await.unwrap();

    let probe = HttpProbe::new(format!("http://{addr}"), PROBE_TIMEOUT).unwrap();
    let targets: Vec<String> = user_insights::evaluation::DEFAULT_TARGETS
        .iter()
        .map(|t| t.to_string())
        .collect();
    let harness = EvaluationHarness::new(store, Arc::new(probe), targets);

    let report = harness.run().await.unwrap();
    assert!(report.tested_endpoints.is_empty());
    assert_eq!(report.endpoints_with_errors.len(), 4);
}
