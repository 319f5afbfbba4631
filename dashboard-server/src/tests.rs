//! Router tests against an in-process app

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use wifi_monitor_core::{AnomalyDetector, FeatureExtractor, MonitorConfig, PacketBuffer, PacketRecord};

use super::config::{CaptureMode, Config};
use super::{create_router, AppState};

fn test_state(dir: &TempDir) -> AppState {
    let monitor = MonitorConfig {
        model_dir: dir.path().join("models"),
        dataset_path: dir.path().join("live_traffic.csv"),
        buffer_capacity: 500,
        contamination: 0.1,
    };
    let config = Config {
        port: 0,
        environment: "test".into(),
        capture: CaptureMode::Disabled,
        capture_interval: Duration::ZERO,
        export_dir: dir.path().join("exports"),
        monitor: monitor.clone(),
    };

    AppState {
        buffer: Arc::new(PacketBuffer::new(monitor.buffer_capacity)),
        detector: Arc::new(AnomalyDetector::with_extractor(monitor, FeatureExtractor::seeded(42))),
        config,
    }
}

/// Current-time packets, every 20th one oversized
fn fill(state: &AppState, n: u64) {
    for i in 0..n {
        let length = if i % 20 == 0 { 1480 } else { 60 + (i * 37) % 600 };
        state.buffer.push(PacketRecord::now("192.168.1.10", "142.250.74.46", if i % 3 == 0 { 17 } else { 6 }, length));
    }
}

async fn send(state: &AppState, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
    let response = create_router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let (status, body) = send(&state, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_trained"], false);
}

#[tokio::test]
async fn test_queue_status_reports_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);
    fill(&state, 3);

    let (status, body) = send(&state, "GET", "/api/queue-status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["queue_size"], 3);
    assert_eq!(body["queue_max_size"], 500);
    assert_eq!(body["is_empty"], false);
    assert_eq!(body["is_full"], false);
}

#[tokio::test]
async fn test_empty_buffer_gives_zero_stats() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let (status, body) = send(&state, "GET", "/api/current-stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["total_packets"], 0);
    assert_eq!(body["stats"]["anomaly_percentage"], 0.0);

    let (status, body) = send(&state, "GET", "/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hourly_stats"].as_array().unwrap().len(), 24);
    assert!(body["recent_anomalies"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_retrain_with_empty_buffer_fails() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let (status, body) = send(&state, "POST", "/api/retrain-model").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert!(!state.detector.is_trained());
}

#[tokio::test]
async fn test_live_data_without_model_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);
    fill(&state, 10);

    let (status, body) = send(&state, "GET", "/api/live-data").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);

    // no bootstrap dataset either
    let (status, _) = send(&state, "GET", "/api/dashboard").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_live_data_rejects_bad_window() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let (status, body) = send(&state, "GET", "/api/live-data?minutes=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_retrain_then_serve() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);
    fill(&state, 120);

    let (status, body) = send(&state, "POST", "/api/retrain-model").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Model retrained with 120 live samples");
    assert_eq!(body["report"]["total_packets"], 120);
    assert!(state.config.monitor.model_path().exists());

    let (status, body) = send(&state, "GET", "/api/live-data?minutes=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_packets"], 120);
    let recent = body["recent_data"].as_array().unwrap();
    assert_eq!(recent.len(), 50);
    assert!(recent[0]["Status"] == "Normal" || recent[0]["Status"] == "Anomaly");
    assert!(recent[0]["Anomaly_Score"].is_f64());

    let (status, body) = send(&state, "GET", "/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["total_packets"], 120);
    let bucketed: u64 = body["hourly_stats"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["normal"].as_u64().unwrap() + b["anomaly"].as_u64().unwrap())
        .sum();
    assert_eq!(bucketed, 120);

    let (_, body) = send(&state, "GET", "/api/history").await;
    assert_eq!(body["total_anomalies"], body["stats"]["anomaly_packets"]);

    let (_, body) = send(&state, "GET", "/api/model-status").await;
    assert_eq!(body["model"]["trained"], true);
    assert_eq!(body["model"]["trained_on"], 120);
    assert_eq!(body["model"]["contamination"], 0.1);
    assert!(body["model"]["decision_offset"].is_f64());
}

#[tokio::test]
async fn test_export_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);
    fill(&state, 5);

    let (status, body) = send(&state, "POST", "/api/export-dataset").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"], 5);

    let path = std::path::PathBuf::from(body["path"].as_str().unwrap());
    let dataset = wifi_monitor_core::read_dataset(&path).unwrap();
    assert_eq!(dataset.records, state.buffer.snapshot());
}
