//! Cache-fronted reads of the precomputed dashboard cells.
//!
//! The dashboard table holds aggregate counts maintained by the
//! store's own formulas (out-of-stock, low-stock, normal, orders
//! today). This service never recomputes them; it only runs the
//! cache-aside protocol over the fixed cells.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use crate::cache::{AppCache, CacheKey};
use crate::common::{display_date, today_yyyymmdd};
use crate::errors::ServiceError;
use crate::models::{tables, StockStatus};
use crate::store::TabularStore;

/// Value column of the dashboard table (column B).
pub const DASHBOARD_VALUE_COL: usize = 1;
/// Row holding the out-of-stock item count (cell B2).
pub const ROW_OUT_COUNT: u32 = 2;
/// Row holding the low-stock item count (cell B3).
pub const ROW_LOW_COUNT: u32 = 3;
/// Row holding the normal-stock item count (cell B4).
pub const ROW_NORMAL_COUNT: u32 = 4;
/// Row holding today's order count (cell B5).
pub const ROW_TODAY_ORDER_COUNT: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardInfo {
    /// Today's date in display form, e.g. `2025년 01월 15일`
    pub today_date: String,
    /// Orders created today
    pub order_count: i64,
    /// 0 critical, 1 warning, 2 normal
    pub stock_status: StockStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStatusCounts {
    pub out_count: i64,
    pub low_count: i64,
    pub normal_count: i64,
}

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn TabularStore>,
    cache: AppCache,
}

impl DashboardService {
    pub fn new(store: Arc<dyn TabularStore>, cache: AppCache) -> Self {
        Self { store, cache }
    }

    async fn read_count(&self, row: u32) -> Result<i64, ServiceError> {
        let cell = self
            .store
            .read_cell(tables::DASHBOARD, row, DASHBOARD_VALUE_COL)
            .await?;
        Ok(cell.as_i64().unwrap_or(0))
    }

    /// Today's order count and overall stock health.
    #[instrument(skip(self))]
    pub async fn dashboard_info(&self) -> Result<DashboardInfo, ServiceError> {
        if let Some(cached) = self.cache.get::<DashboardInfo>(CacheKey::DashboardInfo).await {
            return Ok(cached);
        }

        let order_count = self.read_count(ROW_TODAY_ORDER_COUNT).await?;
        let out_count = self.read_count(ROW_OUT_COUNT).await?;
        let low_count = self.read_count(ROW_LOW_COUNT).await?;

        let info = DashboardInfo {
            today_date: display_date(today_yyyymmdd()),
            order_count,
            stock_status: StockStatus::classify(out_count, low_count),
        };
        self.cache.put(CacheKey::DashboardInfo, &info).await;
        Ok(info)
    }

    /// The three stock-status bucket counts.
    #[instrument(skip(self))]
    pub async fn inventory_status_counts(&self) -> Result<InventoryStatusCounts, ServiceError> {
        if let Some(cached) = self
            .cache
            .get::<InventoryStatusCounts>(CacheKey::InventoryStatus)
            .await
        {
            return Ok(cached);
        }

        let counts = InventoryStatusCounts {
            out_count: self.read_count(ROW_OUT_COUNT).await?,
            low_count: self.read_count(ROW_LOW_COUNT).await?,
            normal_count: self.read_count(ROW_NORMAL_COUNT).await?,
        };
        self.cache.put(CacheKey::InventoryStatus, &counts).await;
        Ok(counts)
    }
}
