//! Shared test harness: an app wired over the in-memory store, plus
//! a failure-injecting store wrapper for the compensation tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::response::Response;
use axum::Router;
use http::{header, Method, Request};
use rust_decimal_macros::dec;
use serde_json::Value;
use tower::ServiceExt;

use stockroom_api::cache::AppCache;
use stockroom_api::config::{AppConfig, CacheConfig};
use stockroom_api::errors::ServiceError;
use stockroom_api::events::EventSender;
use stockroom_api::handlers::AppServices;
use stockroom_api::models::tables;
use stockroom_api::services::receipts::{
    ExportedReceipt, ReceiptExporter, ReceiptPage, ReceiptService,
};
use stockroom_api::store::{Cell, InMemoryStore, StoreError, TableSnapshot, TabularStore};
use stockroom_api::{app_router, AppState};

pub const ITEM_HEADERS: [&str; 9] = [
    "SerialNum",
    "Name",
    "Description",
    "CodeNum",
    "CostB2B",
    "CostB2C",
    "StockNum",
    "ShortageNum",
    "IsShortage",
];

pub const ORDER_HEADERS: [&str; 14] = [
    "Order_SerialNumber",
    "Order_Date",
    "Order_Time",
    "Order_Index",
    "Order_CodeNum",
    "Order_Name",
    "Order_Description",
    "Order_CostB2B",
    "Order_CostB2C",
    "Order_IsB2B",
    "Order_Cnt",
    "PayType",
    "Order_TotalCost",
    "IsCanceled",
];

pub fn item_row(serial: i64, name: &str, code: &str, stock: i64) -> Vec<Cell> {
    vec![
        Cell::Int(serial),
        Cell::text(name),
        Cell::text(format!("{} description", name)),
        Cell::text(code),
        Cell::Number(dec!(900)),
        Cell::Number(dec!(1000)),
        Cell::Int(stock),
        Cell::Int(2),
        Cell::Int(0),
    ]
}

/// Store seeded with the standard test fixtures: two items, an empty
/// order table, dashboard cells and a short revision history.
pub fn seeded_store() -> InMemoryStore {
    InMemoryStore::new()
        .with_table(
            tables::ITEM_INFO,
            &ITEM_HEADERS,
            vec![
                item_row(1, "Widget", "CODE1", 10),
                item_row(2, "Gadget", "CODE2", 5),
            ],
        )
        .with_table(tables::PURCHASE_ORDER, &ORDER_HEADERS, vec![])
        .with_table(
            tables::DASHBOARD,
            &["Metric", "Value"],
            vec![
                vec![Cell::text("OutOfStock"), Cell::Int(0)],
                vec![Cell::text("LowStock"), Cell::Int(1)],
                vec![Cell::text("Normal"), Cell::Int(9)],
                vec![Cell::text("OrdersToday"), Cell::Int(0)],
            ],
        )
        .with_table(
            tables::REVISION_HISTORY,
            &["Revision", "Author", "Date", "Description"],
            vec![
                vec![
                    Cell::text("1.0"),
                    Cell::text("kim"),
                    Cell::text("2024-11-02"),
                    Cell::text("initial release"),
                ],
                vec![
                    Cell::text("1.1"),
                    Cell::text("kim"),
                    Cell::text("2025-01-10"),
                    Cell::text("cache layer"),
                ],
            ],
        )
}

/// Standard fixtures, but with the item and order tables replaced by
/// snapshots taken from another store.
pub fn seeded_store_from(items: TableSnapshot, orders: TableSnapshot) -> InMemoryStore {
    let item_headers: Vec<&str> = items.headers.iter().map(String::as_str).collect();
    let order_headers: Vec<&str> = orders.headers.iter().map(String::as_str).collect();
    seeded_store()
        .with_table(tables::ITEM_INFO, &item_headers, items.rows)
        .with_table(tables::PURCHASE_ORDER, &order_headers, orders.rows)
}

/// Receipt exporter that records pages in memory.
#[derive(Default, Clone)]
pub struct CollectingExporter {
    pub pages: Arc<StdMutex<Vec<(String, ReceiptPage)>>>,
}

#[async_trait]
impl ReceiptExporter for CollectingExporter {
    async fn export(
        &self,
        page: &ReceiptPage,
        file_name: &str,
    ) -> Result<ExportedReceipt, ServiceError> {
        self.pages
            .lock()
            .unwrap()
            .push((file_name.to_string(), page.clone()));
        Ok(ExportedReceipt {
            name: file_name.to_string(),
            location: format!("mem://{}", file_name),
        })
    }
}

/// When the wrapped store starts failing `update_cell` calls.
#[derive(Debug, Clone, Copy)]
pub enum FailureMode {
    /// Fail only the nth update (1-based); later updates succeed, so
    /// compensation can complete.
    NthUpdate(u32),
    /// Fail every update from the nth on; compensation cannot
    /// complete either.
    FromNthUpdate(u32),
}

/// Store wrapper that injects `update_cell` failures.
pub struct FlakyStore {
    inner: InMemoryStore,
    mode: FailureMode,
    updates_seen: AtomicU32,
}

impl FlakyStore {
    pub fn new(inner: InMemoryStore, mode: FailureMode) -> Self {
        Self {
            inner,
            mode,
            updates_seen: AtomicU32::new(0),
        }
    }

    fn should_fail(&self) -> bool {
        let call = self.updates_seen.fetch_add(1, Ordering::SeqCst) + 1;
        match self.mode {
            FailureMode::NthUpdate(n) => call == n,
            FailureMode::FromNthUpdate(n) => call >= n,
        }
    }
}

#[async_trait]
impl TabularStore for FlakyStore {
    async fn snapshot(&self, table: &str) -> Result<TableSnapshot, StoreError> {
        self.inner.snapshot(table).await
    }

    async fn append_row(&self, table: &str, row: Vec<Cell>) -> Result<u32, StoreError> {
        self.inner.append_row(table, row).await
    }

    async fn update_cell(
        &self,
        table: &str,
        row: u32,
        col: usize,
        value: Cell,
    ) -> Result<(), StoreError> {
        if self.should_fail() {
            return Err(StoreError::Unavailable("injected write failure".into()));
        }
        self.inner.update_cell(table, row, col, value).await
    }

    async fn read_cell(&self, table: &str, row: u32, col: usize) -> Result<Cell, StoreError> {
        self.inner.read_cell(table, row, col).await
    }

    async fn delete_row(&self, table: &str, row: u32) -> Result<(), StoreError> {
        self.inner.delete_row(table, row).await
    }

    async fn ensure_table(&self, table: &str, headers: &[&str]) -> Result<bool, StoreError> {
        self.inner.ensure_table(table, headers).await
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        store_id: "test-store".into(),
        output_dir: "receipts".into(),
        guide_image_id: Some("guide-img-1".into()),
        host: "127.0.0.1".into(),
        port: 0,
        environment: "test".into(),
        log_level: "debug".into(),
        log_json: false,
        cache: CacheConfig::default(),
    }
}

pub struct TestApp {
    pub store: Arc<dyn TabularStore>,
    pub cache: AppCache,
    pub services: AppServices,
    pub exporter: CollectingExporter,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(Arc::new(seeded_store()))
    }

    pub fn with_store(store: Arc<dyn TabularStore>) -> Self {
        let cache = AppCache::in_memory();
        let events = EventSender::spawn_default();
        let exporter = CollectingExporter::default();
        let mut services = AppServices::new(
            store.clone(),
            cache.clone(),
            events,
            Arc::new(exporter.clone()),
        );
        // No inter-page delay in tests.
        services.receipts = ReceiptService::with_page_delay(
            services.orders.clone(),
            Arc::new(exporter.clone()),
            Duration::ZERO,
        );

        let state = AppState {
            config: test_config(),
            services: services.clone(),
        };
        Self {
            store,
            cache,
            services,
            exporter,
            router: app_router(state),
        }
    }

    pub async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(path);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.router
            .clone()
            .oneshot(builder.body(body).expect("request build"))
            .await
            .expect("router response")
    }

    pub async fn get(&self, path: &str) -> Response {
        self.request(Method::GET, path, None).await
    }

    pub async fn post_json(&self, path: &str, body: Value) -> Response {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Current stock for a code, read straight from the store.
    pub async fn stock_of(&self, code: &str) -> i64 {
        let snap = self.store.snapshot(tables::ITEM_INFO).await.unwrap();
        let code_col = snap.column("CodeNum").unwrap();
        let stock_col = snap.column("StockNum").unwrap();
        for idx in 0..snap.rows.len() {
            if snap.cell(idx, code_col).display_text() == code {
                return snap.cell(idx, stock_col).as_i64().unwrap_or(0);
            }
        }
        panic!("item {} not seeded", code);
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
