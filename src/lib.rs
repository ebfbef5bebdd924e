//! Stockroom API Library
//!
//! Inventory and purchase-order backend over a row-oriented tabular
//! store, serving a barcode-scan web front end.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod cache;
pub mod common;
pub mod config;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod services;
pub mod store;

use std::time::Duration;

use axum::{
    response::{Html, Json},
    routing::get,
    Router,
};
use http::{HeaderValue, Request};
use serde::Serialize;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

/// Response envelope every endpoint uses. Failures carry
/// `success: false` plus a machine-readable code and message (see
/// [`errors::ServiceError`]).
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

#[derive(Clone, Copy)]
struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// The single UI route: the browser shell that drives the JSON API.
async fn ui_shell() -> Html<&'static str> {
    Html(
        "<!doctype html>\
        <html lang=\"ko\"><head><meta charset=\"utf-8\">\
        <title>Stockroom - Inventory Management</title></head>\
        <body><div id=\"app\">Loading inventory console...</div></body></html>",
    )
}

/// Compose the full application router.
pub fn app_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/api/v1/items", handlers::items::router())
        .nest("/api/v1/access-log", handlers::items::access_log_router())
        .nest(
            "/api/v1/orders",
            handlers::orders::router().merge(handlers::receipts::router()),
        )
        .nest("/api/v1/dashboard", handlers::dashboard::router())
        .nest("/api/v1/guide-image", handlers::dashboard::guide_image_router())
        .nest("/api/v1/memos", handlers::memos::router())
        .nest("/api/v1/revisions", handlers::revisions::router());

    Router::new()
        .route("/", get(ui_shell))
        .route("/health", get(health))
        .merge(api)
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(Duration::from_secs(30))),
        )
        .with_state(state)
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn success_envelope_carries_data() {
        let response = ApiResponse::success(7);
        assert!(response.success);
        assert_eq!(response.data, Some(7));
        assert!(response.message.is_none());
    }

    #[test]
    fn error_envelope_carries_message() {
        let response = ApiResponse::<()>::error("oops".into());
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.message.as_deref(), Some("oops"));
    }

    #[test]
    fn error_envelope_serializes_without_data_noise() {
        let raw = serde_json::to_value(ApiResponse::<()>::error("bad".into())).unwrap();
        assert_eq!(raw["success"], false);
        assert_eq!(raw["message"], "bad");
    }
}
