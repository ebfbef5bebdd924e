//! Cache coherence: derived reads are cached, and any commit or
//! cancel invalidates them before the caller sees success.

mod common;

use common::TestApp;

use stockroom_api::models::tables;
use stockroom_api::services::dashboard::{DASHBOARD_VALUE_COL, ROW_TODAY_ORDER_COUNT};
use stockroom_api::services::orders::{CreateOrderRequest, OrderLineRequest};
use stockroom_api::store::{Cell, TabularStore};

fn one_line_order(date: u32, code: &str, cnt: u32) -> CreateOrderRequest {
    CreateOrderRequest {
        date,
        pay_type: None,
        lines: vec![OrderLineRequest {
            code_num: code.into(),
            cnt,
            is_b2b: false,
        }],
    }
}

async fn set_today_counter(app: &TestApp, value: i64) {
    app.store
        .update_cell(
            tables::DASHBOARD,
            ROW_TODAY_ORDER_COUNT,
            DASHBOARD_VALUE_COL,
            Cell::Int(value),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn dashboard_serves_cached_value_until_a_commit_invalidates_it() {
    let app = TestApp::new();

    let first = app.services.dashboard.dashboard_info().await.unwrap();
    assert_eq!(first.order_count, 0);

    // An out-of-band cell change is invisible while the entry lives.
    set_today_counter(&app, 5).await;
    assert_eq!(
        app.services.dashboard.dashboard_info().await.unwrap().order_count,
        0
    );

    // A commit invalidates the key; the next read sees the store.
    app.services
        .orders
        .create_order(one_line_order(20250115, "CODE1", 1))
        .await
        .unwrap();
    assert_eq!(
        app.services.dashboard.dashboard_info().await.unwrap().order_count,
        5
    );
}

#[tokio::test]
async fn cancel_also_invalidates_the_dashboard_keys() {
    let app = TestApp::new();

    app.services
        .orders
        .create_order(one_line_order(20250115, "CODE1", 1))
        .await
        .unwrap();

    // Prime both caches.
    let counts = app.services.dashboard.inventory_status_counts().await.unwrap();
    assert_eq!(counts.low_count, 1);
    app.services.dashboard.dashboard_info().await.unwrap();

    // Change the underlying cells, then cancel.
    app.store
        .update_cell(tables::DASHBOARD, 3, DASHBOARD_VALUE_COL, Cell::Int(4))
        .await
        .unwrap();
    app.services.orders.cancel_order("202501150001").await.unwrap();

    assert_eq!(
        app.services
            .dashboard
            .inventory_status_counts()
            .await
            .unwrap()
            .low_count,
        4
    );
}

#[tokio::test]
async fn latest_order_cache_is_refreshed_by_commits() {
    let app = TestApp::new();
    let today = stockroom_api::common::today_yyyymmdd();

    // Prime the no-order-today result.
    let empty = app.services.orders.latest_today_order().await.unwrap();
    assert!(!empty.has_order);

    // Committing today must invalidate the cached "no order" entry.
    let commit = app
        .services
        .orders
        .create_order(one_line_order(today, "CODE1", 2))
        .await
        .unwrap();

    let latest = app.services.orders.latest_today_order().await.unwrap();
    assert!(latest.has_order);
    assert_eq!(
        latest.order_serial_number.as_deref(),
        Some(commit.order_serial_number.as_str())
    );
    assert_eq!(latest.total_qty, 2);

    // And canceling refreshes the summary's canceled flag.
    app.services
        .orders
        .cancel_order(&commit.order_serial_number)
        .await
        .unwrap();
    let after_cancel = app.services.orders.latest_today_order().await.unwrap();
    assert_eq!(after_cancel.is_canceled, Some(true));
}

#[tokio::test]
async fn revision_cache_survives_order_mutations() {
    let app = TestApp::new();

    let latest = app.services.revisions.latest_revision().await.unwrap();
    assert_eq!(latest.revision, "1.1");

    // Revision info is not in the mutation key set; a commit must not
    // evict it. Mutate the underlying table to detect re-reads.
    app.store
        .append_row(
            tables::REVISION_HISTORY,
            vec![
                Cell::text("1.2"),
                Cell::text("kim"),
                Cell::text("2025-02-01"),
                Cell::text("uncached change"),
            ],
        )
        .await
        .unwrap();
    app.services
        .orders
        .create_order(one_line_order(20250115, "CODE1", 1))
        .await
        .unwrap();

    assert_eq!(
        app.services.revisions.latest_revision().await.unwrap().revision,
        "1.1"
    );
}

#[tokio::test]
async fn failed_commit_does_not_leave_stale_success_state() {
    let app = TestApp::new();

    // Prime the dashboard cache, then fail a commit on stock.
    app.services.dashboard.dashboard_info().await.unwrap();
    let err = app
        .services
        .orders
        .create_order(one_line_order(20250115, "CODE1", 999))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "insufficient_stock");

    // Validation failures write nothing, so the cached dashboard may
    // legitimately survive; stock stays untouched either way.
    assert_eq!(app.stock_of("CODE1").await, 10);
}
