//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the local dashboard API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the batscope dashboard API
///
/// The spec can be accessed via:
/// - `/api/v1/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "batscope dashboard API",
        version = "0.1.0",
        description = "Local REST/SSE API over a bat-call identification backend: batch uploads with live progress, stored results, and species analytics",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:6790/api/v1", description = "Local dashboard server")
    ),
    paths(
        // Batch
        crate::api::routes::get_batch,
        crate::api::routes::start_batch,
        crate::api::routes::cancel_batch,

        // Results
        crate::api::routes::list_results,
        crate::api::routes::delete_result,

        // Analytics
        crate::api::routes::list_species,
        crate::api::routes::get_species_profile,

        // System
        crate::api::routes::health_check,
        crate::api::routes::get_view,
        crate::api::routes::refresh_views,
        crate::api::routes::chat,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::AnalysisResult,
        crate::types::SpeciesDetected,
        crate::types::CallParameters,
        crate::types::HealthStatus,
        crate::types::Statistics,
        crate::types::SpeciesCount,
        crate::types::BatchProgress,
        crate::types::BatchPhase,
        crate::types::LogLine,
        crate::types::ChatRole,
        crate::types::ChatMessage,
        crate::types::Event,

        // Batch and dashboard views
        crate::batch::BatchSnapshot,
        crate::dashboard::DashboardView,

        // Analytics
        crate::analytics::SpeciesProfile,
        crate::analytics::FrequencyPoint,
        crate::analytics::RadarMetric,

        // Config types from config.rs
        crate::config::AnalysisParams,
        crate::types::InputType,
        crate::types::SpectrogramTheme,

        // API request/response types from routes
        crate::api::routes::BatchAccepted,
        crate::api::routes::BatchCancelResponse,
        crate::api::routes::ChatRequest,
        crate::api::routes::ResultsQuery,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "batch", description = "Batch analysis - Submit files, follow progress, cancel"),
        (name = "results", description = "Stored results - List, filter by species, delete"),
        (name = "analytics", description = "Species analytics - Species lists and averaged call profiles"),
        (name = "system", description = "System endpoints - Health, cached views, chat, OpenAPI spec, events"),
    )
)]
pub struct ApiDoc;
