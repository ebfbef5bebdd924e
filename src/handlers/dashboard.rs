//! Dashboard summary endpoints.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuideImageResponse {
    pub image_id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard_info))
        .route("/inventory-status", get(inventory_status))
}

pub fn guide_image_router() -> Router<AppState> {
    Router::new().route("/", get(guide_image))
}

/// Today's order count and overall stock health.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses((status = 200, description = "Dashboard info returned")),
    tag = "dashboard"
)]
pub async fn dashboard_info(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let info = state.services.dashboard.dashboard_info().await?;
    Ok(Json(ApiResponse::success(info)))
}

/// The out/low/normal stock bucket counts.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/inventory-status",
    responses((status = 200, description = "Status counts returned")),
    tag = "dashboard"
)]
pub async fn inventory_status(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let counts = state.services.dashboard.inventory_status_counts().await?;
    Ok(Json(ApiResponse::success(counts)))
}

/// Asset identifier of the scan-guide image, if configured.
#[utoipa::path(
    get,
    path = "/api/v1/guide-image",
    responses((status = 200, description = "Guide image id returned")),
    tag = "dashboard"
)]
pub async fn guide_image(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(ApiResponse::success(GuideImageResponse {
        image_id: state.config.guide_image_id.clone(),
    })))
}
