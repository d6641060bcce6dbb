//! REST API server module
//!
//! Provides an OpenAPI 3.1 compliant REST API for driving the dashboard:
//! submitting batches, following their progress over SSE, and browsing
//! stored results and species analytics.

use crate::{Config, Dashboard, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Upper bound on a batch upload body
const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Create the API router with all route definitions
///
/// All routes are mounted under `/api/v1`.
///
/// # Routes
///
/// ## Batch
/// - `GET /batch` - Snapshot of the current batch
/// - `POST /batch` - Submit files (multipart), runs in the background
/// - `DELETE /batch` - Cancel the running batch
///
/// ## Results
/// - `GET /results` - Cached stored results (`?species=` filter)
/// - `DELETE /results/:file_id` - Delete a stored result
///
/// ## Analytics
/// - `GET /analytics/species` - Species seen across stored results
/// - `GET /analytics/species/:name` - Averaged call profile of one species
///
/// ## System
/// - `GET /health` - Dashboard liveness
/// - `GET /view` - Cached health, statistics, and results
/// - `POST /refresh` - Re-fetch all cached views
/// - `POST /chat` - Ask the backend assistant
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /events` - Server-sent events stream
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled, not under `/api/v1`)
pub fn create_router(dashboard: Arc<Dashboard>, config: Arc<Config>) -> Router {
    let state = AppState::new(dashboard, config.clone());

    let api = Router::new()
        // Batch
        .route("/batch", get(routes::get_batch))
        .route(
            "/batch",
            post(routes::start_batch).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/batch", delete(routes::cancel_batch))
        // Results
        .route("/results", get(routes::list_results))
        .route("/results/:file_id", delete(routes::delete_result))
        // Analytics
        .route("/analytics/species", get(routes::list_species))
        .route("/analytics/species/:name", get(routes::get_species_profile))
        // System
        .route("/health", get(routes::health_check))
        .route("/view", get(routes::get_view))
        .route("/refresh", post(routes::refresh_views))
        .route("/chat", post(routes::chat))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/events", get(routes::event_stream))
        .with_state(state);

    let router = Router::new().nest("/api/v1", api);

    // Swagger UI reads the document from the /api/v1/openapi.json route above
    let router = if config.server.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api/v1/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.layer(TraceLayer::new_for_http());

    // Apply CORS middleware if enabled in config
    if config.server.api.cors_enabled {
        let cors = build_cors_layer(&config.server.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` (or an empty list) allows any origin; otherwise only the listed
/// origins that parse as header values are allowed.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until the server stops or the surrounding task is aborted.
///
/// # Example
///
/// ```no_run
/// use batscope::{Dashboard, Config};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let dashboard = Arc::new(Dashboard::new((*config).clone())?);
///
/// // Start API server (blocks until shutdown)
/// batscope::api::start_api_server(dashboard, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(dashboard: Arc<Dashboard>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.server.api.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    let app = create_router(dashboard, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %bind_address,
        "API server listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
