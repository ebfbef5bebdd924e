//! Revision-history endpoints.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};

use crate::{errors::ServiceError, ApiResponse, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(revision_history))
        .route("/latest", get(latest_revision))
}

/// Full revision history, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/revisions",
    responses((status = 200, description = "Revision history returned")),
    tag = "revisions"
)]
pub async fn revision_history(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let revisions = state.services.revisions.revision_history().await?;
    Ok(Json(ApiResponse::success(revisions)))
}

/// Most recent revision entry.
#[utoipa::path(
    get,
    path = "/api/v1/revisions/latest",
    responses(
        (status = 200, description = "Latest revision returned"),
        (status = 404, description = "No revision history", body = crate::errors::ErrorResponse)
    ),
    tag = "revisions"
)]
pub async fn latest_revision(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let revision = state.services.revisions.latest_revision().await?;
    Ok(Json(ApiResponse::success(revision)))
}
