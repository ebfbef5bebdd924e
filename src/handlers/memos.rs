//! Memo endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct MemoContentRequest {
    pub content: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(latest_memos).post(add_memo))
        .route("/:row", axum::routing::put(update_memo).delete(delete_memo))
}

/// The ten most recent memos.
#[utoipa::path(
    get,
    path = "/api/v1/memos",
    responses((status = 200, description = "Memo list returned")),
    tag = "memos"
)]
pub async fn latest_memos(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let memos = state.services.memos.latest_memos().await?;
    Ok(Json(ApiResponse::success(memos)))
}

/// Add a memo dated today.
#[utoipa::path(
    post,
    path = "/api/v1/memos",
    request_body = MemoContentRequest,
    responses(
        (status = 201, description = "Memo saved"),
        (status = 400, description = "Empty content", body = crate::errors::ErrorResponse)
    ),
    tag = "memos"
)]
pub async fn add_memo(
    State(state): State<AppState>,
    Json(request): Json<MemoContentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let memo = state.services.memos.add_memo(&request.content).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(memo))))
}

/// Overwrite a memo's content.
#[utoipa::path(
    put,
    path = "/api/v1/memos/{row}",
    params(("row" = u32, Path, description = "Memo row number")),
    request_body = MemoContentRequest,
    responses(
        (status = 200, description = "Memo updated"),
        (status = 404, description = "Memo not found", body = crate::errors::ErrorResponse)
    ),
    tag = "memos"
)]
pub async fn update_memo(
    State(state): State<AppState>,
    Path(row): Path<u32>,
    Json(request): Json<MemoContentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .memos
        .update_memo(row, &request.content)
        .await?;
    Ok(Json(ApiResponse::success(())))
}

/// Delete a memo row.
#[utoipa::path(
    delete,
    path = "/api/v1/memos/{row}",
    params(("row" = u32, Path, description = "Memo row number")),
    responses(
        (status = 200, description = "Memo deleted"),
        (status = 404, description = "Memo not found", body = crate::errors::ErrorResponse)
    ),
    tag = "memos"
)]
pub async fn delete_memo(
    State(state): State<AppState>,
    Path(row): Path<u32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.memos.delete_memo(row).await?;
    Ok(Json(ApiResponse::success(())))
}
