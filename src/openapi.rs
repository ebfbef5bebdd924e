//! OpenAPI document served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockroom API",
        description = "Inventory and purchase-order backend for a barcode-scan storefront"
    ),
    paths(
        crate::handlers::items::list_items,
        crate::handlers::items::search_item,
        crate::handlers::items::log_access,
        crate::handlers::orders::create_order,
        crate::handlers::orders::cancel_order,
        crate::handlers::orders::order_lines,
        crate::handlers::orders::next_index,
        crate::handlers::orders::latest_today,
        crate::handlers::orders::today_count,
        crate::handlers::orders::indexes_for_date,
        crate::handlers::orders::orders_in_range,
        crate::handlers::dashboard::dashboard_info,
        crate::handlers::dashboard::inventory_status,
        crate::handlers::dashboard::guide_image,
        crate::handlers::memos::latest_memos,
        crate::handlers::memos::add_memo,
        crate::handlers::memos::update_memo,
        crate::handlers::memos::delete_memo,
        crate::handlers::revisions::revision_history,
        crate::handlers::revisions::latest_revision,
        crate::handlers::receipts::generate_receipt,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::models::Item,
        crate::models::OrderLine,
        crate::models::Memo,
        crate::models::Revision,
        crate::models::StockStatus,
        crate::services::orders::CreateOrderRequest,
        crate::services::orders::OrderLineRequest,
        crate::services::orders::OrderCommit,
        crate::services::orders::StockUpdate,
        crate::services::orders::OrderCancellation,
        crate::services::orders::RestoredLine,
        crate::services::orders::OrderGroup,
        crate::services::orders::LatestOrderSummary,
        crate::services::dashboard::DashboardInfo,
        crate::services::dashboard::InventoryStatusCounts,
        crate::services::receipts::ReceiptBundle,
        crate::services::receipts::ExportedReceipt,
    )),
    tags(
        (name = "items", description = "Item lookup and scan logging"),
        (name = "orders", description = "Order lifecycle"),
        (name = "dashboard", description = "Aggregate summaries"),
        (name = "memos", description = "Memo notes"),
        (name = "revisions", description = "Revision history"),
        (name = "receipts", description = "Receipt export"),
    )
)]
pub struct ApiDoc;
