//! System handlers: health, cached views, chat, OpenAPI, events.

use super::ChatRequest;
use crate::api::AppState;
use crate::dashboard::DashboardView;
use crate::error::Result;
use crate::types::ChatMessage;
use axum::{
    Json,
    extract::State,
    response::{
        IntoResponse,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

/// GET /health - Liveness of the dashboard itself
///
/// Reports the last known backend reachability without calling the backend.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "system",
    responses(
        (status = 200, description = "Dashboard is running")
    )
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let view = state.dashboard.view().await;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "backend_online": view.is_online,
        "batch_active": state.dashboard.is_batch_active(),
    }))
}

/// GET /view - Cached health, statistics, and results
#[utoipa::path(
    get,
    path = "/api/v1/view",
    tag = "system",
    responses(
        (status = 200, description = "Cached dashboard views", body = DashboardView)
    )
)]
pub async fn get_view(State(state): State<AppState>) -> Json<DashboardView> {
    Json(state.dashboard.view().await)
}

/// POST /refresh - Re-fetch health, statistics, and results
#[utoipa::path(
    post,
    path = "/api/v1/refresh",
    tag = "system",
    responses(
        (status = 200, description = "Views after the refresh; failed fetches keep their old value", body = DashboardView)
    )
)]
pub async fn refresh_views(State(state): State<AppState>) -> Json<DashboardView> {
    Json(state.dashboard.refresh_all().await)
}

/// POST /chat - Ask the backend assistant
#[utoipa::path(
    post,
    path = "/api/v1/chat",
    tag = "system",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatMessage),
        (status = 400, description = "Empty message", body = crate::error::ApiError),
        (status = 502, description = "Backend chat failed", body = crate::error::ApiError)
    )
)]
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatMessage>> {
    let reply = state.dashboard.chat(&request.message).await?;
    Ok(Json(reply))
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/api/v1/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI 3.1 specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}

/// GET /events - Server-sent events stream
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "system",
    responses(
        (status = 200, description = "Server-sent events stream (text/event-stream)", content_type = "text/event-stream")
    )
)]
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = std::result::Result<SseEvent, Infallible>>> {
    let receiver = state.dashboard.subscribe();
    let stream = BroadcastStream::new(receiver);

    let sse_stream = stream.filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json_data) => Some(Ok(SseEvent::default().event(event.kind()).data(json_data))),
            Err(e) => {
                tracing::warn!("Failed to serialize event to JSON: {}", e);
                None
            }
        },
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!("SSE client lagged, skipped {} events", skipped);
            Some(Ok(SseEvent::default().event("error").data(format!(
                r#"{{"error":"lagged","skipped":{}}}"#,
                skipped
            ))))
        }
    });

    Sse::new(sse_stream).keep_alive(KeepAlive::default())
}
