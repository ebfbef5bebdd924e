use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::store::StoreError;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "success": false,
    "code": "insufficient_stock",
    "message": "Insufficient stock: Widget (requested: 20, available: 10)"
}))]
pub struct ErrorResponse {
    /// Always `false` for error responses
    pub success: bool,
    /// Machine-readable error code
    #[schema(example = "insufficient_stock")]
    pub code: String,
    /// Human-readable error description
    #[schema(example = "Insufficient stock: Widget (requested: 20, available: 10)")]
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Order is already canceled: {0}")]
    AlreadyCanceled(String),

    #[error("Exceeded maximum orders per day (9999) for date {0}")]
    OrderLimitExceeded(u32),

    #[error("Invalid table state: {0}")]
    InvalidState(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Partial write: {0}")]
    PartialWriteRisk(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Export error: {0}")]
    ExportError(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::TableNotFound(name) => {
                ServiceError::NotFound(format!("{} table not found", name))
            }
            StoreError::ColumnMissing { table, column } => ServiceError::InvalidState(format!(
                "required column {} not found in {} table",
                column, table
            )),
            StoreError::RowOutOfRange { table, row } => {
                ServiceError::InvalidState(format!("row {} out of range in {} table", row, table))
            }
            StoreError::Unavailable(msg) => ServiceError::StoreUnavailable(msg),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

impl ServiceError {
    /// Stable machine-readable code for programmatic handling by the
    /// front end, independent of the message wording.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::ItemNotFound(_) => "item_not_found",
            Self::OrderNotFound(_) => "order_not_found",
            Self::ValidationError(_) => "validation_error",
            Self::InsufficientStock(_) => "insufficient_stock",
            Self::AlreadyCanceled(_) => "already_canceled",
            Self::OrderLimitExceeded(_) => "order_limit_exceeded",
            Self::InvalidState(_) => "invalid_state",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::PartialWriteRisk(_) => "partial_write_risk",
            Self::CacheError(_) => "cache_error",
            Self::SerializationError(_) => "serialization_error",
            Self::ExportError(_) => "export_failed",
            Self::EventError(_) => "event_error",
            Self::InternalError(_) | Self::Other(_) => "internal_error",
        }
    }

    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::ItemNotFound(_) | Self::OrderNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InsufficientStock(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::AlreadyCanceled(_) | Self::OrderLimitExceeded(_) => StatusCode::CONFLICT,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::ExportError(_) => StatusCode::BAD_GATEWAY,
            Self::InvalidState(_)
            | Self::PartialWriteRisk(_)
            | Self::CacheError(_)
            | Self::SerializationError(_)
            | Self::EventError(_)
            | Self::InternalError(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message suitable for HTTP responses. Internal failures return a
    /// generic message to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::CacheError(_)
            | Self::SerializationError(_)
            | Self::EventError(_)
            | Self::InternalError(_)
            | Self::Other(_) => "Internal server error".to_string(),
            Self::PartialWriteRisk(msg) => format!(
                "Order data may be partially written: {}. Re-read order and stock state before retrying.",
                msg
            ),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "success": false,
            "code": self.code(),
            "message": self.response_message(),
        }));
        tracing::error!(code = self.code(), status = %status, error = %self, "request failed");
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            ServiceError::ItemNotFound("X1".into()).code(),
            "item_not_found"
        );
        assert_eq!(
            ServiceError::InsufficientStock("X1".into()).code(),
            "insufficient_stock"
        );
        assert_eq!(
            ServiceError::AlreadyCanceled("202501150001".into()).code(),
            "already_canceled"
        );
        assert_eq!(
            ServiceError::OrderLimitExceeded(20250115).code(),
            "order_limit_exceeded"
        );
    }

    #[test]
    fn conflict_errors_map_to_409() {
        assert_eq!(
            ServiceError::AlreadyCanceled("202501150001".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::OrderLimitExceeded(20250115).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = ServiceError::CacheError("backend gone".into());
        assert_eq!(err.response_message(), "Internal server error");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn store_errors_convert() {
        let err: ServiceError = StoreError::TableNotFound("PurchaseOrder".into()).into();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err: ServiceError = StoreError::ColumnMissing {
            table: "ItemInfo".into(),
            column: "StockNum".into(),
        }
        .into();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }
}
