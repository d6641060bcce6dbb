//! Species analytics handlers.

use crate::analytics::{SpeciesProfile, species_profile, unique_species};
use crate::api::AppState;
use crate::error::{Error, Result};
use axum::{
    Json,
    extract::{Path, State},
};

/// GET /analytics/species - Species seen across stored results
#[utoipa::path(
    get,
    path = "/api/v1/analytics/species",
    tag = "analytics",
    responses(
        (status = 200, description = "Distinct species names, first-seen order", body = Vec<String>)
    )
)]
pub async fn list_species(State(state): State<AppState>) -> Json<Vec<String>> {
    let view = state.dashboard.view().await;
    Json(unique_species(&view.results))
}

/// GET /analytics/species/:name - Call profile of one species
#[utoipa::path(
    get,
    path = "/api/v1/analytics/species/{name}",
    tag = "analytics",
    params(
        ("name" = String, Path, description = "Species name")
    ),
    responses(
        (status = 200, description = "Averaged call parameters", body = SpeciesProfile),
        (status = 404, description = "No result has this species as its top detection", body = crate::error::ApiError)
    )
)]
pub async fn get_species_profile(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<SpeciesProfile>> {
    let view = state.dashboard.view().await;
    species_profile(&view.results, &name)
        .map(Json)
        .ok_or_else(|| Error::NotFound(format!("species '{name}'")))
}
