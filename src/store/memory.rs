//! Thread-safe in-memory tabular store.
//!
//! Backs local runs and the test suite; the production deployment
//! points the same trait at the external spreadsheet service.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use super::{Cell, StoreError, TableSnapshot, TabularStore};

#[derive(Debug, Clone)]
struct MemTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// In-memory implementation of [`TabularStore`].
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<DashMap<String, MemTable>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with headers and seed rows in one step.
    pub fn with_table(self, name: &str, headers: &[&str], rows: Vec<Vec<Cell>>) -> Self {
        self.tables.insert(
            name.to_string(),
            MemTable {
                headers: headers.iter().map(|h| h.to_string()).collect(),
                rows,
            },
        );
        self
    }

    fn data_index(table: &MemTable, name: &str, row: u32) -> Result<usize, StoreError> {
        // Row 1 is the header; data rows start at 2.
        if row < 2 || (row as usize - 2) >= table.rows.len() {
            return Err(StoreError::RowOutOfRange {
                table: name.to_string(),
                row,
            });
        }
        Ok(row as usize - 2)
    }
}

#[async_trait]
impl TabularStore for InMemoryStore {
    async fn snapshot(&self, table: &str) -> Result<TableSnapshot, StoreError> {
        let entry = self
            .tables
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        Ok(TableSnapshot {
            name: table.to_string(),
            headers: entry.headers.clone(),
            rows: entry.rows.clone(),
        })
    }

    async fn append_row(&self, table: &str, row: Vec<Cell>) -> Result<u32, StoreError> {
        let mut entry = self
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        entry.rows.push(row);
        Ok(entry.rows.len() as u32 + 1)
    }

    async fn update_cell(
        &self,
        table: &str,
        row: u32,
        col: usize,
        value: Cell,
    ) -> Result<(), StoreError> {
        let mut entry = self
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        let idx = Self::data_index(&entry, table, row)?;
        let target = &mut entry.rows[idx];
        if col >= target.len() {
            target.resize(col + 1, Cell::Empty);
        }
        target[col] = value;
        Ok(())
    }

    async fn read_cell(&self, table: &str, row: u32, col: usize) -> Result<Cell, StoreError> {
        let entry = self
            .tables
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        let idx = Self::data_index(&entry, table, row)?;
        Ok(entry
            .rows[idx]
            .get(col)
            .cloned()
            .unwrap_or(Cell::Empty))
    }

    async fn delete_row(&self, table: &str, row: u32) -> Result<(), StoreError> {
        let mut entry = self
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        let idx = Self::data_index(&entry, table, row)?;
        entry.rows.remove(idx);
        Ok(())
    }

    async fn ensure_table(&self, table: &str, headers: &[&str]) -> Result<bool, StoreError> {
        if self.tables.contains_key(table) {
            return Ok(false);
        }
        self.tables.insert(
            table.to_string(),
            MemTable {
                headers: headers.iter().map(|h| h.to_string()).collect(),
                rows: Vec::new(),
            },
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryStore {
        InMemoryStore::new().with_table(
            "ItemInfo",
            &["SerialNum", "Name", "CodeNum", "StockNum"],
            vec![
                vec![Cell::Int(1), Cell::text("Widget"), Cell::text("CODE1"), Cell::Int(10)],
                vec![Cell::Int(2), Cell::text("Gadget"), Cell::text("CODE2"), Cell::Int(3)],
            ],
        )
    }

    #[tokio::test]
    async fn snapshot_and_append() {
        let store = store();
        let snap = store.snapshot("ItemInfo").await.unwrap();
        assert_eq!(snap.rows.len(), 2);
        assert_eq!(snap.column("CodeNum").unwrap(), 2);

        let row_num = store
            .append_row(
                "ItemInfo",
                vec![Cell::Int(3), Cell::text("Sprocket"), Cell::text("CODE3"), Cell::Int(0)],
            )
            .await
            .unwrap();
        assert_eq!(row_num, 4);
        assert_eq!(store.snapshot("ItemInfo").await.unwrap().rows.len(), 3);
    }

    #[tokio::test]
    async fn update_and_read_cell_roundtrip() {
        let store = store();
        store
            .update_cell("ItemInfo", 2, 3, Cell::Int(7))
            .await
            .unwrap();
        assert_eq!(store.read_cell("ItemInfo", 2, 3).await.unwrap(), Cell::Int(7));
    }

    #[tokio::test]
    async fn header_row_is_not_addressable() {
        let store = store();
        let err = store.update_cell("ItemInfo", 1, 0, Cell::Int(0)).await;
        assert!(matches!(err, Err(StoreError::RowOutOfRange { row: 1, .. })));
    }

    #[tokio::test]
    async fn missing_table_reported() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.snapshot("Memo").await,
            Err(StoreError::TableNotFound(_))
        ));
    }

    #[tokio::test]
    async fn ensure_table_is_idempotent() {
        let store = InMemoryStore::new();
        assert!(store.ensure_table("Memo", &["Date", "Index", "Content"]).await.unwrap());
        assert!(!store.ensure_table("Memo", &["Date", "Index", "Content"]).await.unwrap());
    }
}
