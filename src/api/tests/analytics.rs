use super::*;

#[tokio::test]
async fn test_list_species() {
    let server = MockServer::start().await;
    mount_stored_results(&server).await;
    let (dashboard, app) = app_for(create_test_dashboard(&server));
    dashboard.refresh_results().await.unwrap();

    let response = app.oneshot(get("/api/v1/analytics/species")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!(["Myotis daubentonii", "Pipistrellus pipistrellus"])
    );
}

#[tokio::test]
async fn test_species_profile() {
    let server = MockServer::start().await;
    mount_stored_results(&server).await;
    let (dashboard, app) = app_for(create_test_dashboard(&server));
    dashboard.refresh_results().await.unwrap();

    let response = app
        .oneshot(get("/api/v1/analytics/species/Myotis%20daubentonii"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let profile = json_body(response).await;
    // r-3 only has Myotis as a secondary detection
    assert_eq!(profile["count"], 2);
    assert_eq!(profile["avg_peak"], 46.0);
    assert_eq!(profile["avg_bandwidth"], 32.0);
    assert_eq!(profile["frequency_series"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_species_profile_unknown_species() {
    let (_dashboard, app) = offline_app();

    let response = app
        .oneshot(get("/api/v1/analytics/species/Nyctalus%20noctula"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"]["code"], "not_found");
}
