//! Receipt export endpoint.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use crate::{errors::ServiceError, ApiResponse, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/:serial/receipt", post(generate_receipt))
}

/// Export the order's receipt pages through the configured exporter.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{serial}/receipt",
    params(("serial" = String, Path, description = "Order serial number")),
    responses(
        (status = 200, description = "Receipt exported"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 502, description = "Export failed", body = crate::errors::ErrorResponse)
    ),
    tag = "receipts"
)]
pub async fn generate_receipt(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let bundle = state.services.receipts.generate(&serial).await?;
    Ok(Json(ApiResponse::success(bundle)))
}
