//! Inventory index: item lookup by code and validated stock moves.
//!
//! Lookup is a linear scan over the `CodeNum` column; the table is
//! small and the authoritative copy lives in the external store, so
//! no index is kept in memory.

use std::sync::Arc;
use tracing::instrument;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{tables, Item, ItemColumns};
use crate::store::{Cell, TabularStore};

/// An item located in the table, with the row it was found on.
#[derive(Debug, Clone)]
pub struct LocatedItem {
    pub item: Item,
    pub row_number: u32,
}

#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn TabularStore>,
    events: EventSender,
}

impl InventoryService {
    pub fn new(store: Arc<dyn TabularStore>, events: EventSender) -> Self {
        Self { store, events }
    }

    /// Find an item by its code number.
    #[instrument(skip(self))]
    pub async fn find_by_code(&self, code_num: &str) -> Result<Item, ServiceError> {
        Ok(self.locate_by_code(code_num).await?.item)
    }

    /// Find an item and report the row it lives on. Used by the order
    /// engine, which writes stock back by row.
    pub async fn locate_by_code(&self, code_num: &str) -> Result<LocatedItem, ServiceError> {
        let code = code_num.trim();
        if code.is_empty() {
            return Err(ServiceError::ValidationError(
                "Please enter a code number.".to_string(),
            ));
        }

        let snap = self.store.snapshot(tables::ITEM_INFO).await?;
        let cols = ItemColumns::resolve(&snap)?;

        for idx in 0..snap.rows.len() {
            if snap.cell(idx, cols.code_num).display_text().trim() == code {
                return Ok(LocatedItem {
                    item: Item::read(&snap, idx, &cols),
                    row_number: snap.row_number(idx),
                });
            }
        }

        Err(ServiceError::ItemNotFound(format!(
            "Code number not found: {}",
            code
        )))
    }

    /// All registered items, skipping rows without a serial number.
    #[instrument(skip(self))]
    pub async fn all_items(&self) -> Result<Vec<Item>, ServiceError> {
        let snap = self.store.snapshot(tables::ITEM_INFO).await?;
        let cols = ItemColumns::resolve(&snap)?;

        let mut items = Vec::with_capacity(snap.rows.len());
        for idx in 0..snap.rows.len() {
            if snap.cell(idx, cols.serial_num).is_empty() {
                continue;
            }
            items.push(Item::read(&snap, idx, &cols));
        }
        Ok(items)
    }

    /// Apply a stock delta (negative = consumption, positive =
    /// restoration) and return the new stock level. Never lets stock
    /// go below zero.
    #[instrument(skip(self))]
    pub async fn adjust_stock(&self, code_num: &str, delta: i64) -> Result<i64, ServiceError> {
        let located = self.locate_by_code(code_num).await?;
        let new_stock = located.item.stock_num + delta;
        if new_stock < 0 {
            return Err(ServiceError::InsufficientStock(format!(
                "{} (requested: {}, available: {})",
                located.item.name,
                delta.abs(),
                located.item.stock_num
            )));
        }

        let snap = self.store.snapshot(tables::ITEM_INFO).await?;
        let cols = ItemColumns::resolve(&snap)?;
        self.store
            .update_cell(
                tables::ITEM_INFO,
                located.row_number,
                cols.stock_num,
                Cell::Int(new_stock),
            )
            .await?;

        self.events.publish(Event::StockAdjusted {
            code_num: located.item.code_num.clone(),
            delta,
            new_stock,
        });
        Ok(new_stock)
    }
}
