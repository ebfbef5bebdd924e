//! HTTP handlers, one module per domain surface.

use std::sync::Arc;

use crate::cache::AppCache;
use crate::events::EventSender;
use crate::services::access_log::AccessLogService;
use crate::services::dashboard::DashboardService;
use crate::services::inventory::InventoryService;
use crate::services::memos::MemoService;
use crate::services::orders::OrderService;
use crate::services::receipts::{JsonFileExporter, ReceiptExporter, ReceiptService};
use crate::services::revisions::RevisionService;
use crate::services::sequencer::OrderSequencer;
use crate::store::TabularStore;

pub mod dashboard;
pub mod items;
pub mod memos;
pub mod orders;
pub mod receipts;
pub mod revisions;

/// Aggregated services used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub inventory: InventoryService,
    pub orders: OrderService,
    pub dashboard: DashboardService,
    pub memos: MemoService,
    pub revisions: RevisionService,
    pub access_log: AccessLogService,
    pub receipts: ReceiptService,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn TabularStore>,
        cache: AppCache,
        events: EventSender,
        receipt_exporter: Arc<dyn ReceiptExporter>,
    ) -> Self {
        let inventory = InventoryService::new(store.clone(), events.clone());
        let sequencer = OrderSequencer::new(store.clone());
        let orders = OrderService::new(
            store.clone(),
            cache.clone(),
            events.clone(),
            inventory.clone(),
            sequencer,
        );
        let receipts = ReceiptService::new(orders.clone(), receipt_exporter);

        Self {
            inventory,
            dashboard: DashboardService::new(store.clone(), cache.clone()),
            memos: MemoService::new(store.clone()),
            revisions: RevisionService::new(store.clone(), cache),
            access_log: AccessLogService::new(store, events),
            orders,
            receipts,
        }
    }

    /// Services over a filesystem receipt exporter, the default wiring.
    pub fn with_output_dir(
        store: Arc<dyn TabularStore>,
        cache: AppCache,
        events: EventSender,
        output_dir: &str,
    ) -> Self {
        Self::new(
            store,
            cache,
            events,
            Arc::new(JsonFileExporter::new(output_dir)),
        )
    }
}
