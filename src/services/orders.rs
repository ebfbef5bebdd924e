//! Order transaction engine.
//!
//! Commit path: validate every line read-only, then append the order
//! rows, then write the decremented stock values, then invalidate the
//! derived caches. The store offers no cross-row atomicity, so the
//! two write phases run as explicit forward steps with recorded
//! compensations: a failure after step N first undoes steps 1..N
//! (restore stock, void appended rows) and only then surfaces a
//! partial-write error. Cancellation is the mirror image: mark every
//! line canceled, restore stock, invalidate.
//!
//! Commits and cancellations are serialized behind one in-process
//! writer lock, so two near-simultaneous submissions cannot observe
//! the same max index and mint colliding serial numbers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::cache::{AppCache, CacheKey, MUTATION_KEYS};
use crate::common::{now_time_string, today_yyyymmdd, validate_date};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{
    tables, ItemColumns, OrderColumns, OrderLine, OrderSerial, CANCELED_MARK, DEFAULT_PAY_TYPE,
};
use crate::services::inventory::InventoryService;
use crate::services::sequencer::OrderSequencer;
use crate::store::{Cell, TabularStore};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    /// Item code to order
    pub code_num: String,
    /// Quantity, must be positive
    pub cnt: u32,
    /// Pricing tier: B2B unit cost when true, B2C otherwise
    #[serde(default)]
    pub is_b2b: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Order date as YYYYMMDD
    pub date: u32,
    /// Payment type; defaults to card when omitted
    pub pay_type: Option<String>,
    #[validate(length(min = 1, message = "Order must contain at least one line"))]
    pub lines: Vec<OrderLineRequest>,
}

/// One stock write applied by a committed order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdate {
    pub code_num: String,
    pub name: String,
    pub previous_stock: i64,
    pub order_cnt: u32,
    pub new_stock: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderCommit {
    pub order_serial_number: String,
    pub stock_updates: Vec<StockUpdate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestoredLine {
    pub code_num: String,
    pub cnt: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderCancellation {
    pub serial_number: String,
    pub canceled_rows: usize,
    pub restored_items: Vec<RestoredLine>,
}

/// All lines of one order, grouped for range queries.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderGroup {
    pub date: u32,
    pub index: u32,
    pub lines: Vec<OrderLine>,
}

/// Summary of the most recent order created today.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LatestOrderSummary {
    pub has_order: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_canceled: Option<bool>,
    pub item_count: usize,
    pub total_qty: i64,
    pub total_amount: Decimal,
    /// First few lines, for the dashboard preview
    pub items: Vec<OrderLine>,
}

impl LatestOrderSummary {
    fn none() -> Self {
        Self {
            has_order: false,
            order_serial_number: None,
            order_index: None,
            order_time: None,
            pay_type: None,
            is_canceled: None,
            item_count: 0,
            total_qty: 0,
            total_amount: Decimal::ZERO,
            items: Vec::new(),
        }
    }
}

/// Lines shown in the latest-order preview.
const LATEST_ORDER_PREVIEW_LINES: usize = 3;

struct ValidatedLine {
    item_row: u32,
    update: StockUpdate,
    line: OrderLine,
}

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn TabularStore>,
    cache: AppCache,
    events: EventSender,
    inventory: InventoryService,
    sequencer: OrderSequencer,
    write_lock: Arc<Mutex<()>>,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn TabularStore>,
        cache: AppCache,
        events: EventSender,
        inventory: InventoryService,
        sequencer: OrderSequencer,
    ) -> Self {
        Self {
            store,
            cache,
            events,
            inventory,
            sequencer,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn sequencer(&self) -> &OrderSequencer {
        &self.sequencer
    }

    /// Validate, commit and post-process one order.
    #[instrument(skip(self, request), fields(date = request.date, lines = request.lines.len()))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderCommit, ServiceError> {
        request.validate()?;
        validate_date(request.date)?;

        let mut seen_codes = HashSet::new();
        for line in &request.lines {
            if line.cnt == 0 {
                return Err(ServiceError::ValidationError(format!(
                    "Quantity must be positive for item {}",
                    line.code_num
                )));
            }
            if !seen_codes.insert(line.code_num.trim().to_string()) {
                return Err(ServiceError::ValidationError(format!(
                    "Duplicate item in order: {}",
                    line.code_num
                )));
            }
        }

        let _guard = self.write_lock.lock().await;

        let index = self.sequencer.next_index(request.date).await?;
        let serial = OrderSerial::new(request.date, index);

        let pay_type = request
            .pay_type
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PAY_TYPE)
            .to_string();
        let time = now_time_string();

        // Pure validation pass over every line before any write: the
        // whole order is rejected if a single line cannot be filled.
        let item_snap = self.store.snapshot(tables::ITEM_INFO).await?;
        let item_cols = ItemColumns::resolve(&item_snap)?;

        let mut validated: Vec<ValidatedLine> = Vec::with_capacity(request.lines.len());
        for line_req in &request.lines {
            let located = self.inventory.locate_by_code(&line_req.code_num).await?;
            let item = located.item;
            if item.stock_num < line_req.cnt as i64 {
                return Err(ServiceError::InsufficientStock(format!(
                    "{} (requested: {}, available: {})",
                    item.name, line_req.cnt, item.stock_num
                )));
            }

            let unit_cost = item.tier_cost(line_req.is_b2b);
            validated.push(ValidatedLine {
                item_row: located.row_number,
                update: StockUpdate {
                    code_num: item.code_num.clone(),
                    name: item.name.clone(),
                    previous_stock: item.stock_num,
                    order_cnt: line_req.cnt,
                    new_stock: item.stock_num - line_req.cnt as i64,
                },
                line: OrderLine {
                    serial_number: serial.serial_number(),
                    date: request.date,
                    time: time.clone(),
                    index,
                    code_num: item.code_num,
                    name: item.name,
                    description: item.description,
                    cost_b2b: item.cost_b2b,
                    cost_b2c: item.cost_b2c,
                    is_b2b: line_req.is_b2b,
                    cnt: line_req.cnt,
                    pay_type: pay_type.clone(),
                    total_cost: unit_cost * Decimal::from(line_req.cnt),
                    is_canceled: false,
                },
            });
        }

        let order_snap = self.store.snapshot(tables::PURCHASE_ORDER).await?;
        let order_cols = OrderColumns::resolve(&order_snap)?;
        let stock_col = item_cols.stock_num;

        // Forward step 1: append one order row per line.
        let mut appended_rows: Vec<u32> = Vec::new();
        for v in &validated {
            match self
                .store
                .append_row(tables::PURCHASE_ORDER, v.line.to_row())
                .await
            {
                Ok(row) => appended_rows.push(row),
                Err(err) => {
                    return Err(self
                        .compensate_commit(
                            &appended_rows,
                            &[],
                            &validated,
                            order_cols.is_canceled,
                            stock_col,
                            err.into(),
                        )
                        .await)
                }
            }
        }

        // Forward step 2: write the decremented stock values.
        let mut applied: Vec<usize> = Vec::new();
        for (i, v) in validated.iter().enumerate() {
            match self
                .store
                .update_cell(
                    tables::ITEM_INFO,
                    v.item_row,
                    stock_col,
                    Cell::Int(v.update.new_stock),
                )
                .await
            {
                Ok(()) => applied.push(i),
                Err(err) => {
                    return Err(self
                        .compensate_commit(
                            &appended_rows,
                            &applied,
                            &validated,
                            order_cols.is_canceled,
                            stock_col,
                            err.into(),
                        )
                        .await)
                }
            }
        }

        // Post-commit: derived caches must not serve pre-mutation data
        // once the caller sees success.
        self.cache.invalidate(&MUTATION_KEYS).await;
        self.events.publish(Event::OrderCommitted {
            serial_number: serial.serial_number(),
            line_count: validated.len(),
        });

        Ok(OrderCommit {
            order_serial_number: serial.serial_number(),
            stock_updates: validated.into_iter().map(|v| v.update).collect(),
        })
    }

    async fn compensate_commit(
        &self,
        appended_rows: &[u32],
        applied: &[usize],
        validated: &[ValidatedLine],
        canceled_col: usize,
        stock_col: usize,
        cause: ServiceError,
    ) -> ServiceError {
        let mut incomplete: Vec<String> = Vec::new();

        for &i in applied.iter().rev() {
            let v = &validated[i];
            if self
                .store
                .update_cell(
                    tables::ITEM_INFO,
                    v.item_row,
                    stock_col,
                    Cell::Int(v.update.previous_stock),
                )
                .await
                .is_err()
            {
                incomplete.push(format!("stock for {}", v.update.code_num));
            }
        }
        for &row in appended_rows {
            if self
                .store
                .update_cell(
                    tables::PURCHASE_ORDER,
                    row,
                    canceled_col,
                    Cell::text(CANCELED_MARK),
                )
                .await
                .is_err()
            {
                incomplete.push(format!("order row {}", row));
            }
        }

        self.cache.invalidate(&MUTATION_KEYS).await;

        if incomplete.is_empty() {
            warn!(error = %cause, "order commit failed; compensations applied");
            ServiceError::PartialWriteRisk(format!(
                "commit aborted ({}); all applied changes were compensated",
                cause
            ))
        } else {
            error!(error = %cause, pending = ?incomplete, "order commit failed and compensation is incomplete");
            ServiceError::PartialWriteRisk(format!(
                "commit aborted ({}); compensation incomplete for {}",
                cause,
                incomplete.join(", ")
            ))
        }
    }

    /// Cancel a whole order: flag every line and put the stock back.
    #[instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        serial_number: &str,
    ) -> Result<OrderCancellation, ServiceError> {
        let serial = serial_number.trim().to_string();
        if OrderSerial::parse(&serial).is_none() {
            return Err(ServiceError::ValidationError(format!(
                "Invalid order serial number: {}",
                serial
            )));
        }

        let _guard = self.write_lock.lock().await;

        let snap = self.store.snapshot(tables::PURCHASE_ORDER).await?;
        let cols = OrderColumns::resolve(&snap)?;

        let mut rows_to_cancel: Vec<u32> = Vec::new();
        let mut lines: Vec<OrderLine> = Vec::new();
        for idx in 0..snap.rows.len() {
            if snap.cell(idx, cols.serial_number).display_text() == serial {
                let line = OrderLine::read(&snap, idx, &cols);
                // The whole order is rejected, not re-canceled for the
                // lines that happen to still be active.
                if line.is_canceled {
                    return Err(ServiceError::AlreadyCanceled(serial));
                }
                rows_to_cancel.push(snap.row_number(idx));
                lines.push(line);
            }
        }
        if rows_to_cancel.is_empty() {
            return Err(ServiceError::OrderNotFound(serial));
        }

        // Forward step 1: flag every line canceled.
        let mut marked: Vec<u32> = Vec::new();
        for &row in &rows_to_cancel {
            match self
                .store
                .update_cell(
                    tables::PURCHASE_ORDER,
                    row,
                    cols.is_canceled,
                    Cell::text(CANCELED_MARK),
                )
                .await
            {
                Ok(()) => marked.push(row),
                Err(err) => {
                    return Err(self
                        .compensate_cancel(&marked, &[], cols.is_canceled, err.into())
                        .await)
                }
            }
        }

        // Forward step 2: restore stock per line. An item row that no
        // longer exists is skipped; the cancellation still stands.
        let item_snap = match self.store.snapshot(tables::ITEM_INFO).await {
            Ok(snap) => snap,
            Err(err) => {
                return Err(self
                    .compensate_cancel(&marked, &[], cols.is_canceled, err.into())
                    .await)
            }
        };
        let item_cols = match ItemColumns::resolve(&item_snap) {
            Ok(cols) => cols,
            Err(err) => {
                return Err(self
                    .compensate_cancel(&marked, &[], cols.is_canceled, err.into())
                    .await)
            }
        };

        let mut restored: Vec<(u32, i64)> = Vec::new();
        let mut restored_items: Vec<RestoredLine> = Vec::new();
        for line in &lines {
            match self.inventory.locate_by_code(&line.code_num).await {
                Ok(located) => {
                    let new_stock = located.item.stock_num + line.cnt as i64;
                    match self
                        .store
                        .update_cell(
                            tables::ITEM_INFO,
                            located.row_number,
                            item_cols.stock_num,
                            Cell::Int(new_stock),
                        )
                        .await
                    {
                        Ok(()) => {
                            restored.push((located.row_number, located.item.stock_num));
                            restored_items.push(RestoredLine {
                                code_num: line.code_num.clone(),
                                cnt: line.cnt,
                            });
                        }
                        Err(err) => {
                            return Err(self
                                .compensate_cancel(
                                    &marked,
                                    &restored,
                                    cols.is_canceled,
                                    err.into(),
                                )
                                .await)
                        }
                    }
                }
                Err(ServiceError::ItemNotFound(_)) => {
                    warn!(code_num = %line.code_num, "item row missing during cancellation; stock not restored for this line");
                }
                Err(err) => {
                    return Err(self
                        .compensate_cancel(&marked, &restored, cols.is_canceled, err)
                        .await)
                }
            }
        }

        self.cache.invalidate(&MUTATION_KEYS).await;
        self.events.publish(Event::OrderCanceled {
            serial_number: serial.clone(),
            restored_lines: restored_items.len(),
        });

        Ok(OrderCancellation {
            serial_number: serial,
            canceled_rows: marked.len(),
            restored_items,
        })
    }

    async fn compensate_cancel(
        &self,
        marked: &[u32],
        restored: &[(u32, i64)],
        canceled_col: usize,
        cause: ServiceError,
    ) -> ServiceError {
        let mut incomplete: Vec<String> = Vec::new();

        // Undo the stock restorations, then unflag the rows.
        let stock_col = match self.store.snapshot(tables::ITEM_INFO).await {
            Ok(snap) => ItemColumns::resolve(&snap).map(|c| c.stock_num).ok(),
            Err(_) => None,
        };
        for &(row, previous_stock) in restored.iter().rev() {
            let undone = match stock_col {
                Some(col) => self
                    .store
                    .update_cell(tables::ITEM_INFO, row, col, Cell::Int(previous_stock))
                    .await
                    .is_ok(),
                None => false,
            };
            if !undone {
                incomplete.push(format!("stock at row {}", row));
            }
        }
        for &row in marked {
            if self
                .store
                .update_cell(tables::PURCHASE_ORDER, row, canceled_col, Cell::Empty)
                .await
                .is_err()
            {
                incomplete.push(format!("cancel flag at row {}", row));
            }
        }

        self.cache.invalidate(&MUTATION_KEYS).await;

        if incomplete.is_empty() {
            warn!(error = %cause, "order cancellation failed; compensations applied");
            ServiceError::PartialWriteRisk(format!(
                "cancellation aborted ({}); all applied changes were compensated",
                cause
            ))
        } else {
            error!(error = %cause, pending = ?incomplete, "order cancellation failed and compensation is incomplete");
            ServiceError::PartialWriteRisk(format!(
                "cancellation aborted ({}); compensation incomplete for {}",
                cause,
                incomplete.join(", ")
            ))
        }
    }

    /// Every line of the order with the given serial number.
    #[instrument(skip(self))]
    pub async fn order_lines(&self, serial_number: &str) -> Result<Vec<OrderLine>, ServiceError> {
        let serial = serial_number.trim();
        let snap = self.store.snapshot(tables::PURCHASE_ORDER).await?;
        let cols = OrderColumns::resolve(&snap)?;

        let mut lines = Vec::new();
        for idx in 0..snap.rows.len() {
            if snap.cell(idx, cols.serial_number).display_text() == serial {
                lines.push(OrderLine::read(&snap, idx, &cols));
            }
        }
        if lines.is_empty() {
            return Err(ServiceError::OrderNotFound(format!(
                "No orders found for serial number {}",
                serial
            )));
        }
        Ok(lines)
    }

    /// Sorted distinct order indexes assigned on the given date.
    #[instrument(skip(self))]
    pub async fn order_indexes_for_date(&self, date: u32) -> Result<Vec<u32>, ServiceError> {
        validate_date(date)?;
        let snap = self.store.snapshot(tables::PURCHASE_ORDER).await?;
        let cols = OrderColumns::resolve(&snap)?;

        let mut indexes = BTreeSet::new();
        for idx in 0..snap.rows.len() {
            if snap.cell(idx, cols.date).as_u32() == Some(date) {
                if let Some(order_index) = snap.cell(idx, cols.index).as_u32() {
                    indexes.insert(order_index);
                }
            }
        }
        if indexes.is_empty() {
            return Err(ServiceError::OrderNotFound(format!(
                "No orders found for date {}",
                date
            )));
        }
        Ok(indexes.into_iter().collect())
    }

    /// Orders between two dates inclusive, grouped by serial number
    /// and sorted by date then index.
    #[instrument(skip(self))]
    pub async fn orders_in_range(
        &self,
        start_date: u32,
        end_date: u32,
    ) -> Result<Vec<OrderGroup>, ServiceError> {
        validate_date(start_date)?;
        validate_date(end_date)?;
        if start_date > end_date {
            return Err(ServiceError::ValidationError(format!(
                "Start date {} is after end date {}",
                start_date, end_date
            )));
        }

        let snap = self.store.snapshot(tables::PURCHASE_ORDER).await?;
        let cols = OrderColumns::resolve(&snap)?;

        let mut groups: BTreeMap<(u32, u32), Vec<OrderLine>> = BTreeMap::new();
        for idx in 0..snap.rows.len() {
            let Some(date) = snap.cell(idx, cols.date).as_u32() else {
                continue;
            };
            if date < start_date || date > end_date {
                continue;
            }
            let line = OrderLine::read(&snap, idx, &cols);
            groups.entry((line.date, line.index)).or_default().push(line);
        }

        Ok(groups
            .into_iter()
            .map(|((date, index), lines)| OrderGroup { date, index, lines })
            .collect())
    }

    /// Cache-fronted summary of the most recent order created today.
    #[instrument(skip(self))]
    pub async fn latest_today_order(&self) -> Result<LatestOrderSummary, ServiceError> {
        if let Some(cached) = self
            .cache
            .get::<LatestOrderSummary>(CacheKey::LatestOrder)
            .await
        {
            return Ok(cached);
        }

        let today = today_yyyymmdd();
        let snap = self.store.snapshot(tables::PURCHASE_ORDER).await?;
        let cols = OrderColumns::resolve(&snap)?;

        let mut max_index = 0u32;
        for idx in 0..snap.rows.len() {
            if snap.cell(idx, cols.date).as_u32() == Some(today) {
                max_index = max_index.max(snap.cell(idx, cols.index).as_u32().unwrap_or(0));
            }
        }
        if max_index == 0 {
            let summary = LatestOrderSummary::none();
            self.cache.put(CacheKey::LatestOrder, &summary).await;
            return Ok(summary);
        }

        let serial = OrderSerial::new(today, max_index).serial_number();
        let mut lines = Vec::new();
        for idx in 0..snap.rows.len() {
            if snap.cell(idx, cols.serial_number).display_text() == serial {
                lines.push(OrderLine::read(&snap, idx, &cols));
            }
        }

        let total_amount: Decimal = lines.iter().map(|l| l.total_cost).sum();
        let total_qty: i64 = lines.iter().map(|l| l.cnt as i64).sum();
        let summary = LatestOrderSummary {
            has_order: true,
            order_serial_number: Some(serial),
            order_index: Some(max_index),
            order_time: lines.first().map(|l| l.time.clone()),
            pay_type: lines.first().map(|l| l.pay_type.clone()),
            is_canceled: lines.first().map(|l| l.is_canceled),
            item_count: lines.len(),
            total_qty,
            total_amount,
            items: lines.into_iter().take(LATEST_ORDER_PREVIEW_LINES).collect(),
        };
        self.cache.put(CacheKey::LatestOrder, &summary).await;
        Ok(summary)
    }
}
