//! Stored result handlers.

use super::ResultsQuery;
use crate::analytics::{SpeciesFilter, filter_by_species};
use crate::api::AppState;
use crate::error::Result;
use crate::types::AnalysisResult;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

/// GET /results - Cached stored results
#[utoipa::path(
    get,
    path = "/api/v1/results",
    tag = "results",
    params(ResultsQuery),
    responses(
        (status = 200, description = "Stored results, optionally filtered by species", body = Vec<AnalysisResult>)
    )
)]
pub async fn list_results(
    State(state): State<AppState>,
    Query(query): Query<ResultsQuery>,
) -> Json<Vec<AnalysisResult>> {
    let view = state.dashboard.view().await;
    let filter = SpeciesFilter::from_query(query.species.as_deref());

    Json(
        filter_by_species(&view.results, &filter)
            .into_iter()
            .cloned()
            .collect(),
    )
}

/// DELETE /results/:file_id - Delete a stored result
#[utoipa::path(
    delete,
    path = "/api/v1/results/{file_id}",
    tag = "results",
    params(
        ("file_id" = String, Path, description = "Backend file ID")
    ),
    responses(
        (status = 204, description = "Result deleted"),
        (status = 502, description = "Backend refused the deletion", body = crate::error::ApiError)
    )
)]
pub async fn delete_result(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<StatusCode> {
    state.dashboard.delete_result(&file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
