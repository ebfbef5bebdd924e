//! Per-day order index assignment.
//!
//! The authoritative source is a scan over the order table: the next
//! index is one past the highest index already assigned for the date.
//! Canceled rows stay in the table, so an index is never reused.
//!
//! The dashboard keeps a formula-maintained "orders today" counter.
//! That counter is exposed for reporting but deliberately not used
//! for sequencing: it can drift when rows are edited out-of-band, and
//! a drifted counter would mint duplicate serial numbers.

use std::sync::Arc;
use tracing::instrument;

use crate::common::validate_date;
use crate::errors::ServiceError;
use crate::models::{tables, OrderColumns, MAX_ORDER_INDEX};
use crate::services::dashboard::{DASHBOARD_VALUE_COL, ROW_TODAY_ORDER_COUNT};
use crate::store::TabularStore;

#[derive(Clone)]
pub struct OrderSequencer {
    store: Arc<dyn TabularStore>,
}

impl OrderSequencer {
    pub fn new(store: Arc<dyn TabularStore>) -> Self {
        Self { store }
    }

    /// Next free index for the date, in `1..=9999`. Read-only:
    /// calling it twice without an intervening commit returns the
    /// same value.
    #[instrument(skip(self))]
    pub async fn next_index(&self, date: u32) -> Result<u32, ServiceError> {
        validate_date(date)?;

        let snap = self.store.snapshot(tables::PURCHASE_ORDER).await?;
        let cols = OrderColumns::resolve(&snap)?;

        let mut max_index = 0u32;
        for idx in 0..snap.rows.len() {
            if snap.cell(idx, cols.date).as_u32() == Some(date) {
                let row_index = snap.cell(idx, cols.index).as_u32().unwrap_or(0);
                max_index = max_index.max(row_index);
            }
        }

        let next = max_index + 1;
        if next > MAX_ORDER_INDEX {
            return Err(ServiceError::OrderLimitExceeded(date));
        }
        Ok(next)
    }

    /// Fast-path read of the precomputed "orders today" counter cell.
    /// Reporting only; see the module notes.
    #[instrument(skip(self))]
    pub async fn today_order_count(&self) -> Result<i64, ServiceError> {
        let cell = self
            .store
            .read_cell(tables::DASHBOARD, ROW_TODAY_ORDER_COUNT, DASHBOARD_VALUE_COL)
            .await?;
        Ok(cell.as_i64().unwrap_or(0))
    }
}
