use super::test_helpers::*;
use super::*;
use crate::client::UploadFile;
use crate::config::AnalysisParams;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};


fn uploads(count: usize) -> Vec<UploadFile> {
    (0..count)
        .map(|i| UploadFile::new(format!("rec_{i}.wav"), b"RIFF".to_vec()))
        .collect()
}

/// Mount the endpoints a finished batch triggers
async fn mount_refresh_endpoints(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total_analyses": 3})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/results"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"file_id": "b-1-f0"}, {"file_id": "b-1-f1"}]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_new_rejects_invalid_config() {
    let mut config = test_config("http://localhost:8000");
    config.analysis.threshold = 1.5;

    let result = Dashboard::new(config);
    assert!(matches!(result, Err(crate::Error::Config { .. })));
}

#[tokio::test]
async fn test_new_rejects_zero_health_interval() {
    let mut config = test_config("http://localhost:8000");
    config.monitor.enabled = true;
    config.monitor.health_interval = std::time::Duration::ZERO;

    let result = Dashboard::new(config);
    assert!(matches!(result, Err(crate::Error::Config { .. })));
}

#[tokio::test]
async fn test_shutdown_refuses_new_batches_and_emits_event() {
    let dashboard = create_offline_dashboard();
    let mut events = dashboard.subscribe();

    dashboard.shutdown().await;

    assert!(dashboard.is_shutting_down());
    let err = dashboard
        .submit_batch(uploads(1), &AnalysisParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, crate::Error::ShuttingDown));

    wait_for_event(&mut events, |e| matches!(e, crate::types::Event::Shutdown)).await;
}

#[tokio::test]
async fn test_shutdown_cancels_running_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze/batch"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(batch_body("b-1", 1, 0))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;
    let dashboard = create_test_dashboard(&server);

    let handle = dashboard
        .spawn_batch(uploads(1), AnalysisParams::default())
        .unwrap();
    dashboard.shutdown().await;

    let outcome = handle.await.unwrap().unwrap();
    assert_eq!(outcome, crate::batch::BatchOutcome::Cancelled);
    assert!(!dashboard.is_batch_active());
}

#[tokio::test]
async fn test_monitor_disabled_finishes_immediately() {
    let dashboard = create_offline_dashboard();
    let handle = dashboard.start_health_monitor();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_monitor_polls_until_shutdown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health/detailed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"services": {"model": "healthy"}})),
        )
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.monitor.enabled = true;
    config.monitor.health_interval = Duration::from_secs(3600);
    let dashboard = Dashboard::new(config).unwrap();
    let mut events = dashboard.subscribe();

    let handle = dashboard.start_health_monitor();
    wait_for_event(&mut events, |e| {
        matches!(e, crate::types::Event::HealthChanged { online: true })
    })
    .await;

    dashboard.shutdown().await;
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(dashboard.view().await.is_online);
}
