//! Memo notes: append, update, delete, latest-10 listing.
//!
//! Memos have no cross-entity invariants; rows are addressed by their
//! absolute row number, which the listing exposes to the client.

use std::sync::Arc;
use tracing::instrument;

use crate::common::today_yyyymmdd;
use crate::errors::ServiceError;
use crate::models::{require_content, tables, Memo};
use crate::store::{Cell, StoreError, TabularStore};

const MEMO_HEADERS: [&str; 3] = ["Date", "Index", "Content"];

/// How many memos the listing returns.
const LATEST_MEMO_COUNT: usize = 10;

#[derive(Clone)]
pub struct MemoService {
    store: Arc<dyn TabularStore>,
}

impl MemoService {
    pub fn new(store: Arc<dyn TabularStore>) -> Self {
        Self { store }
    }

    async fn ensure_table(&self) -> Result<(), ServiceError> {
        if self.store.ensure_table(tables::MEMO, &MEMO_HEADERS).await? {
            tracing::info!("memo table created");
        }
        Ok(())
    }

    /// The ten most recent memos, newest first.
    #[instrument(skip(self))]
    pub async fn latest_memos(&self) -> Result<Vec<Memo>, ServiceError> {
        self.ensure_table().await?;
        let snap = self.store.snapshot(tables::MEMO).await?;
        let date_col = snap.column("Date")?;
        let index_col = snap.column("Index")?;
        let content_col = snap.column("Content")?;

        let mut memos = Vec::new();
        for idx in 0..snap.rows.len() {
            let content = snap.cell(idx, content_col).display_text();
            let Some(date) = snap.cell(idx, date_col).as_u32() else {
                continue;
            };
            if content.is_empty() {
                continue;
            }
            memos.push(Memo {
                row_number: snap.row_number(idx),
                date,
                index: snap.cell(idx, index_col).as_u32().unwrap_or(0),
                content,
            });
        }

        memos.sort_by(|a, b| b.date.cmp(&a.date).then(b.index.cmp(&a.index)));
        memos.truncate(LATEST_MEMO_COUNT);
        Ok(memos)
    }

    /// Append a memo dated today, with the next per-day index.
    #[instrument(skip(self, content))]
    pub async fn add_memo(&self, content: &str) -> Result<Memo, ServiceError> {
        let content = require_content(content, "Memo content")?;
        self.ensure_table().await?;

        let today = today_yyyymmdd();
        let snap = self.store.snapshot(tables::MEMO).await?;
        let date_col = snap.column("Date")?;
        let index_col = snap.column("Index")?;

        let mut max_index = 0u32;
        for idx in 0..snap.rows.len() {
            if snap.cell(idx, date_col).as_u32() == Some(today) {
                max_index = max_index.max(snap.cell(idx, index_col).as_u32().unwrap_or(0));
            }
        }
        let index = max_index + 1;

        let row_number = self
            .store
            .append_row(
                tables::MEMO,
                vec![Cell::from(today), Cell::from(index), Cell::text(content.clone())],
            )
            .await?;

        Ok(Memo {
            row_number,
            date: today,
            index,
            content,
        })
    }

    /// Overwrite the content of the memo at the given row.
    #[instrument(skip(self, content))]
    pub async fn update_memo(&self, row_number: u32, content: &str) -> Result<(), ServiceError> {
        let content = require_content(content, "Memo content")?;
        let snap = self.store.snapshot(tables::MEMO).await?;
        let content_col = snap.column("Content")?;

        self.store
            .update_cell(tables::MEMO, row_number, content_col, Cell::text(content))
            .await
            .map_err(|err| match err {
                StoreError::RowOutOfRange { row, .. } => {
                    ServiceError::NotFound(format!("Memo not found at row {}", row))
                }
                other => other.into(),
            })
    }

    /// Remove the memo row entirely.
    #[instrument(skip(self))]
    pub async fn delete_memo(&self, row_number: u32) -> Result<(), ServiceError> {
        self.store
            .delete_row(tables::MEMO, row_number)
            .await
            .map_err(|err| match err {
                StoreError::RowOutOfRange { row, .. } => {
                    ServiceError::NotFound(format!("Memo not found at row {}", row))
                }
                other => other.into(),
            })
    }
}
