//! Order lifecycle endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::services::orders::CreateOrderRequest;
use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct NextIndexQuery {
    /// Order date as YYYYMMDD
    pub date: u32,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DateRangeQuery {
    /// Range start as YYYYMMDD, inclusive
    pub start_date: u32,
    /// Range end as YYYYMMDD, inclusive
    pub end_date: u32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NextIndexResponse {
    pub order_index: u32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodayOrderCountResponse {
    pub order_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderIndexListResponse {
    pub order_list: Vec<u32>,
    pub count: usize,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/next-index", get(next_index))
        .route("/latest-today", get(latest_today))
        .route("/today-count", get(today_count))
        .route("/range", get(orders_in_range))
        .route("/by-date/:date", get(indexes_for_date))
        .route("/:serial", get(order_lines))
        .route("/:serial/cancel", post(cancel_order))
}

/// Commit a new order: validate stock, write the order lines and the
/// decremented stock values, invalidate the derived caches.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order committed"),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse),
        (status = 409, description = "Daily order limit exceeded", body = crate::errors::ErrorResponse),
        (status = 500, description = "Partial write, reconcile before retrying", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let commit = state.services.orders.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(commit))))
}

/// Cancel a whole order and restore its stock.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{serial}/cancel",
    params(("serial" = String, Path, description = "Order serial number")),
    responses(
        (status = 200, description = "Order canceled"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order already canceled", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let cancellation = state.services.orders.cancel_order(&serial).await?;
    Ok(Json(ApiResponse::success(cancellation)))
}

/// All lines of one order.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{serial}",
    params(("serial" = String, Path, description = "Order serial number")),
    responses(
        (status = 200, description = "Order lines returned"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn order_lines(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let lines = state.services.orders.order_lines(&serial).await?;
    Ok(Json(ApiResponse::success(lines)))
}

/// Next free order index for a date. Read-only; the commit path
/// re-derives the index itself.
#[utoipa::path(
    get,
    path = "/api/v1/orders/next-index",
    params(NextIndexQuery),
    responses(
        (status = 200, description = "Next index returned"),
        (status = 409, description = "Daily order limit exceeded", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn next_index(
    State(state): State<AppState>,
    Query(query): Query<NextIndexQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let order_index = state
        .services
        .orders
        .sequencer()
        .next_index(query.date)
        .await?;
    Ok(Json(ApiResponse::success(NextIndexResponse { order_index })))
}

/// Summary of the latest order created today.
#[utoipa::path(
    get,
    path = "/api/v1/orders/latest-today",
    responses((status = 200, description = "Latest order summary returned")),
    tag = "orders"
)]
pub async fn latest_today(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let summary = state.services.orders.latest_today_order().await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// Fast-path read of the precomputed "orders today" counter.
#[utoipa::path(
    get,
    path = "/api/v1/orders/today-count",
    responses((status = 200, description = "Order count returned")),
    tag = "orders"
)]
pub async fn today_count(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let order_count = state.services.orders.sequencer().today_order_count().await?;
    Ok(Json(ApiResponse::success(TodayOrderCountResponse {
        order_count,
    })))
}

/// Distinct order indexes assigned on a date.
#[utoipa::path(
    get,
    path = "/api/v1/orders/by-date/{date}",
    params(("date" = u32, Path, description = "Order date as YYYYMMDD")),
    responses(
        (status = 200, description = "Index list returned"),
        (status = 404, description = "No orders for that date", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn indexes_for_date(
    State(state): State<AppState>,
    Path(date): Path<u32>,
) -> Result<impl IntoResponse, ServiceError> {
    let order_list = state.services.orders.order_indexes_for_date(date).await?;
    let count = order_list.len();
    Ok(Json(ApiResponse::success(OrderIndexListResponse {
        order_list,
        count,
    })))
}

/// Orders in an inclusive date range, grouped by serial number.
#[utoipa::path(
    get,
    path = "/api/v1/orders/range",
    params(DateRangeQuery),
    responses((status = 200, description = "Order groups returned")),
    tag = "orders"
)]
pub async fn orders_in_range(
    State(state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let groups = state
        .services
        .orders
        .orders_in_range(query.start_date, query.end_date)
        .await?;
    Ok(Json(ApiResponse::success(groups)))
}
