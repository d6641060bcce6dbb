use super::*;
use crate::dashboard::test_helpers::batch_body;
use crate::types::Event;

const BOUNDARY: &str = "batscope-test-boundary";

/// Multipart body with one `files` part per name plus plain text fields
fn multipart_body(files: &[&str], fields: &[(&str, &str)]) -> Body {
    let mut body = String::new();
    for name in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: audio/wav\r\n\r\nRIFF\r\n"
        ));
    }
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    Body::from(body)
}

fn post_batch(files: &[&str], fields: &[(&str, &str)]) -> Request {
    Request::builder()
        .method("POST")
        .uri("/api/v1/batch")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(multipart_body(files, fields))
        .unwrap()
}

#[tokio::test]
async fn test_get_batch_when_idle() {
    let (_dashboard, app) = offline_app();

    let response = app.oneshot(get("/api/v1/batch")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["phase"]["state"], "idle");
    assert!(json["batch_id"].is_null());
    assert_eq!(json["results"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_post_batch_runs_in_background() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze/batch"))
        .respond_with(ResponseTemplate::new(200).set_body_string(batch_body("b-9", 2, 0)))
        .expect(1)
        .mount(&server)
        .await;
    let (dashboard, app) = app_for(create_test_dashboard(&server));
    let mut events = dashboard.subscribe();

    let response = app
        .clone()
        .oneshot(post_batch(&["a.wav", "b.wav"], &[("theme", "plasma")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = json_body(response).await;
    assert_eq!(json["status"], "accepted");
    assert_eq!(json["files"], 2);

    wait_for_event(&mut events, |e| matches!(e, Event::BatchCompleted { .. })).await;

    let response = app.oneshot(get("/api/v1/batch")).await.unwrap();
    let snapshot = json_body(response).await;
    assert_eq!(snapshot["batch_id"], "b-9");
    assert_eq!(snapshot["progress"]["completed"], 2);
    assert_eq!(snapshot["results"][0]["file_id"], "b-9-f1");
}

#[tokio::test]
async fn test_post_batch_without_files() {
    let (_dashboard, app) = offline_app();

    let response = app
        .oneshot(post_batch(&[], &[("threshold", "0.2")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "no_files");
}

#[tokio::test]
async fn test_post_batch_rejects_bad_fields() {
    let (dashboard, app) = offline_app();

    let response = app
        .clone()
        .oneshot(post_batch(&["a.wav"], &[("theme", "sepia")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "validation_error");

    let response = app
        .oneshot(post_batch(&["a.wav"], &[("max_freq", "0")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "config_error");

    assert!(!dashboard.is_batch_active());
}

#[tokio::test]
async fn test_post_batch_conflicts_with_running_batch() {
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
    let (dashboard, app) = app_for(create_test_dashboard(&server));
    let mut events = dashboard.subscribe();

    let first = app
        .clone()
        .oneshot(post_batch(&["a.wav"], &[]))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::ACCEPTED);

    let second = app
        .clone()
        .oneshot(post_batch(&["b.wav"], &[]))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(second).await["error"]["code"], "batch_in_progress");

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/v1/batch")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(json_body(response).await["cancelled"], true);

    wait_for_event(&mut events, |e| matches!(e, Event::BatchCancelled { .. })).await;
}

#[tokio::test]
async fn test_cancel_without_batch() {
    let (_dashboard, app) = offline_app();

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/v1/batch")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["cancelled"], false);
}
