//! Item lookup and scan logging.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogAccessRequest {
    pub code_num: String,
    #[serde(default)]
    pub client_ip: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items))
        .route("/:code", get(search_item))
}

pub fn access_log_router() -> Router<AppState> {
    Router::new().route("/", post(log_access))
}

/// All registered items.
#[utoipa::path(
    get,
    path = "/api/v1/items",
    responses(
        (status = 200, description = "Item list returned"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn list_items(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let items = state.services.inventory.all_items().await?;
    Ok(Json(ApiResponse::success(items)))
}

/// Look up one item by its code number.
#[utoipa::path(
    get,
    path = "/api/v1/items/{code}",
    params(("code" = String, Path, description = "Item code number")),
    responses(
        (status = 200, description = "Item found"),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn search_item(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.services.inventory.find_by_code(&code).await?;
    Ok(Json(ApiResponse::success(item)))
}

/// Record a barcode scan in the access log.
#[utoipa::path(
    post,
    path = "/api/v1/access-log",
    request_body = LogAccessRequest,
    responses((status = 200, description = "Scan recorded")),
    tag = "items"
)]
pub async fn log_access(
    State(state): State<AppState>,
    Json(request): Json<LogAccessRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let ip = request.client_ip.as_deref().unwrap_or("unknown");
    state
        .services
        .access_log
        .log_access(&request.code_num, ip)
        .await?;
    Ok(Json(ApiResponse::success(())))
}
