use super::*;
use crate::dashboard::test_helpers::{
    create_offline_dashboard, create_test_dashboard, test_config, wait_for_event,
};
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod analytics;
mod batch;

/// Router over a dashboard whose backend refuses connections
fn offline_app() -> (Arc<Dashboard>, Router) {
    app_for(create_offline_dashboard())
}

fn app_for(dashboard: Dashboard) -> (Arc<Dashboard>, Router) {
    let dashboard = Arc::new(dashboard);
    let config = Arc::new(dashboard.get_config().clone());
    let app = create_router(dashboard.clone(), config);
    (dashboard, app)
}

fn get(uri: &str) -> Request {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Mount a stored-results listing with two Myotis and one Pipistrellus result
async fn mount_stored_results(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/results"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {
                    "file_id": "r-1",
                    "original_filename": "pond_a.wav",
                    "species_detected": [{"species": "Myotis daubentonii", "confidence": 0.91}],
                    "call_parameters": {"peak_frequency": 45.0, "bandwidth": 30.0, "pulse_duration": 4.0}
                },
                {
                    "file_id": "r-2",
                    "original_filename": "pond_b.wav",
                    "species_detected": [{"species": "Myotis daubentonii", "confidence": 0.72}],
                    "call_parameters": {"peak_frequency": 47.0, "bandwidth": 34.0, "pulse_duration": 5.0}
                },
                {
                    "file_id": "r-3",
                    "original_filename": "hedge.wav",
                    "species_detected": [
                        {"species": "Pipistrellus pipistrellus", "confidence": 0.88},
                        {"species": "Myotis daubentonii", "confidence": 0.05}
                    ]
                }
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_api_server_spawns() {
    let (dashboard, _app) = offline_app();

    // Port 0 = OS assigns a free port
    let mut config = dashboard.get_config().clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let api_handle = tokio::spawn({
        let dashboard = dashboard.clone();
        let config = config.clone();
        async move { start_api_server(dashboard, config).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!api_handle.is_finished(), "server should still be serving");

    api_handle.abort();
}

#[tokio::test]
async fn test_spawn_api_server_reports_bind_failure() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = test_config("http://127.0.0.1:9");
    config.server.api.bind_address = occupied.local_addr().unwrap();
    let dashboard = Arc::new(Dashboard::new(config).unwrap());

    let result = tokio::time::timeout(Duration::from_secs(2), dashboard.spawn_api_server())
        .await
        .unwrap()
        .unwrap();

    assert!(matches!(result, Err(crate::Error::Io(_))));
}

#[tokio::test]
async fn test_cors_enabled() {
    let mut config = test_config("http://127.0.0.1:9");
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];
    let (_dashboard, app) = app_for(Dashboard::new(config).unwrap());

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_restricted_origins() {
    let mut config = test_config("http://127.0.0.1:9");
    config.server.api.cors_origins = vec!["http://localhost:5173".to_string()];
    let (_dashboard, app) = app_for(Dashboard::new(config).unwrap());

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("Origin", "http://evil.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_swagger_ui_can_be_disabled() {
    let mut config = test_config("http://127.0.0.1:9");
    config.server.api.swagger_ui = false;
    let (_dashboard, app) = app_for(Dashboard::new(config).unwrap());

    let response = app.oneshot(get("/swagger-ui/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_routes_live_under_api_v1() {
    let (_dashboard, app) = offline_app();

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get("/api/v1/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
