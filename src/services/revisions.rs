//! Revision-history reads.

use std::sync::Arc;
use tracing::instrument;

use crate::cache::{AppCache, CacheKey};
use crate::errors::ServiceError;
use crate::models::{tables, Revision};
use crate::store::{TableSnapshot, TabularStore};

#[derive(Clone)]
pub struct RevisionService {
    store: Arc<dyn TabularStore>,
    cache: AppCache,
}

impl RevisionService {
    pub fn new(store: Arc<dyn TabularStore>, cache: AppCache) -> Self {
        Self { store, cache }
    }

    fn read_all(snap: &TableSnapshot) -> Result<Vec<Revision>, ServiceError> {
        let revision_col = snap.column("Revision")?;
        let author_col = snap.column("Author")?;
        let date_col = snap.column("Date")?;
        let description_col = snap.column("Description")?;

        let mut revisions = Vec::with_capacity(snap.rows.len());
        for idx in 0..snap.rows.len() {
            if snap.cell(idx, revision_col).is_empty() {
                continue;
            }
            revisions.push(Revision {
                revision: snap.cell(idx, revision_col).display_text(),
                author: snap.cell(idx, author_col).display_text(),
                date: snap.cell(idx, date_col).display_text(),
                description: snap.cell(idx, description_col).display_text(),
            });
        }
        Ok(revisions)
    }

    /// Most recent revision row, cache-fronted.
    #[instrument(skip(self))]
    pub async fn latest_revision(&self) -> Result<Revision, ServiceError> {
        if let Some(cached) = self.cache.get::<Revision>(CacheKey::RevisionInfo).await {
            return Ok(cached);
        }

        let snap = self.store.snapshot(tables::REVISION_HISTORY).await?;
        let latest = Self::read_all(&snap)?
            .into_iter()
            .last()
            .ok_or_else(|| ServiceError::NotFound("No revision history found".to_string()))?;

        self.cache.put(CacheKey::RevisionInfo, &latest).await;
        Ok(latest)
    }

    /// Full history, oldest first.
    #[instrument(skip(self))]
    pub async fn revision_history(&self) -> Result<Vec<Revision>, ServiceError> {
        let snap = self.store.snapshot(tables::REVISION_HISTORY).await?;
        Self::read_all(&snap)
    }
}
