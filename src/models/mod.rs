//! Domain types and their row codecs.
//!
//! The store keeps loosely typed cells with a couple of string
//! conventions: the canceled flag is the text marker `취소` (empty
//! means active) and the B2B flag is 0/1. Those encodings are decoded
//! here, immediately on read; nothing outside this module handles the
//! raw markers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;
use crate::store::{Cell, StoreError, TableSnapshot};

/// Table names as laid out in the backing store.
pub mod tables {
    pub const ITEM_INFO: &str = "ItemInfo";
    pub const PURCHASE_ORDER: &str = "PurchaseOrder";
    pub const REVISION_HISTORY: &str = "RevisionHistory";
    pub const MEMO: &str = "Memo";
    pub const DASHBOARD: &str = "Dashboard";
    pub const ACCESS_LOG: &str = "AccessLog";
}

/// Text marker the store uses for a canceled order row.
pub const CANCELED_MARK: &str = "취소";

/// Pay type recorded when the client does not send one.
pub const DEFAULT_PAY_TYPE: &str = "카드";

/// Highest order index assignable within one day.
pub const MAX_ORDER_INDEX: u32 = 9999;

/// Order identifier: date plus per-day sequence, rendered as
/// `YYYYMMDD` followed by the zero-padded 4-digit index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSerial {
    pub date: u32,
    pub index: u32,
}

impl OrderSerial {
    pub fn new(date: u32, index: u32) -> Self {
        Self { date, index }
    }

    pub fn serial_number(&self) -> String {
        format!("{}{:04}", self.date, self.index)
    }

    /// Parse a 12-character serial back into its parts.
    pub fn parse(serial: &str) -> Option<Self> {
        if serial.len() != 12 || !serial.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let date = serial[..8].parse().ok()?;
        let index = serial[8..].parse().ok()?;
        Some(Self { date, index })
    }
}

impl std::fmt::Display for OrderSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.serial_number())
    }
}

/// One inventory item row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub serial_num: i64,
    pub name: String,
    pub description: String,
    pub code_num: String,
    pub cost_b2b: Decimal,
    pub cost_b2c: Decimal,
    pub stock_num: i64,
    pub shortage_num: i64,
    pub is_shortage: bool,
}

/// Resolved column indexes of the `ItemInfo` table.
#[derive(Debug, Clone, Copy)]
pub struct ItemColumns {
    pub serial_num: usize,
    pub name: usize,
    pub description: usize,
    pub code_num: usize,
    pub cost_b2b: usize,
    pub cost_b2c: usize,
    pub stock_num: usize,
    pub shortage_num: usize,
    pub is_shortage: usize,
}

impl ItemColumns {
    pub fn resolve(snap: &TableSnapshot) -> Result<Self, StoreError> {
        Ok(Self {
            serial_num: snap.column("SerialNum")?,
            name: snap.column("Name")?,
            description: snap.column("Description")?,
            code_num: snap.column("CodeNum")?,
            cost_b2b: snap.column("CostB2B")?,
            cost_b2c: snap.column("CostB2C")?,
            stock_num: snap.column("StockNum")?,
            shortage_num: snap.column("ShortageNum")?,
            is_shortage: snap.column("IsShortage")?,
        })
    }
}

impl Item {
    pub fn read(snap: &TableSnapshot, idx: usize, cols: &ItemColumns) -> Self {
        Item {
            serial_num: snap.cell(idx, cols.serial_num).as_i64().unwrap_or(0),
            name: snap.cell(idx, cols.name).display_text(),
            description: snap.cell(idx, cols.description).display_text(),
            code_num: snap.cell(idx, cols.code_num).display_text().trim().to_string(),
            cost_b2b: snap.cell(idx, cols.cost_b2b).as_decimal().unwrap_or_default(),
            cost_b2c: snap.cell(idx, cols.cost_b2c).as_decimal().unwrap_or_default(),
            stock_num: snap.cell(idx, cols.stock_num).as_i64().unwrap_or(0),
            shortage_num: snap.cell(idx, cols.shortage_num).as_i64().unwrap_or(0),
            is_shortage: snap.cell(idx, cols.is_shortage).as_i64().unwrap_or(0) != 0,
        }
    }

    /// Unit price for the given pricing tier.
    pub fn tier_cost(&self, is_b2b: bool) -> Decimal {
        if is_b2b {
            self.cost_b2b
        } else {
            self.cost_b2c
        }
    }
}

/// One purchase-order line row. An order is the set of lines sharing
/// a serial number; lines are flagged canceled, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub serial_number: String,
    pub date: u32,
    pub time: String,
    pub index: u32,
    pub code_num: String,
    pub name: String,
    pub description: String,
    pub cost_b2b: Decimal,
    pub cost_b2c: Decimal,
    pub is_b2b: bool,
    pub cnt: u32,
    pub pay_type: String,
    pub total_cost: Decimal,
    pub is_canceled: bool,
}

/// Resolved column indexes of the `PurchaseOrder` table.
#[derive(Debug, Clone, Copy)]
pub struct OrderColumns {
    pub serial_number: usize,
    pub date: usize,
    pub time: usize,
    pub index: usize,
    pub code_num: usize,
    pub name: usize,
    pub description: usize,
    pub cost_b2b: usize,
    pub cost_b2c: usize,
    pub is_b2b: usize,
    pub cnt: usize,
    pub pay_type: usize,
    pub total_cost: usize,
    pub is_canceled: usize,
}

impl OrderColumns {
    pub fn resolve(snap: &TableSnapshot) -> Result<Self, StoreError> {
        Ok(Self {
            serial_number: snap.column("Order_SerialNumber")?,
            date: snap.column("Order_Date")?,
            time: snap.column("Order_Time")?,
            index: snap.column("Order_Index")?,
            code_num: snap.column("Order_CodeNum")?,
            name: snap.column("Order_Name")?,
            description: snap.column("Order_Description")?,
            cost_b2b: snap.column("Order_CostB2B")?,
            cost_b2c: snap.column("Order_CostB2C")?,
            is_b2b: snap.column("Order_IsB2B")?,
            cnt: snap.column("Order_Cnt")?,
            pay_type: snap.column("PayType")?,
            total_cost: snap.column("Order_TotalCost")?,
            is_canceled: snap.column("IsCanceled")?,
        })
    }
}

impl OrderLine {
    pub fn read(snap: &TableSnapshot, idx: usize, cols: &OrderColumns) -> Self {
        let time = snap.cell(idx, cols.time).display_text();
        let pay_type = snap.cell(idx, cols.pay_type).display_text();
        OrderLine {
            serial_number: snap.cell(idx, cols.serial_number).display_text(),
            date: snap.cell(idx, cols.date).as_u32().unwrap_or(0),
            time: if time.is_empty() { "-".to_string() } else { time },
            index: snap.cell(idx, cols.index).as_u32().unwrap_or(0),
            code_num: snap.cell(idx, cols.code_num).display_text().trim().to_string(),
            name: snap.cell(idx, cols.name).display_text(),
            description: snap.cell(idx, cols.description).display_text(),
            cost_b2b: snap.cell(idx, cols.cost_b2b).as_decimal().unwrap_or_default(),
            cost_b2c: snap.cell(idx, cols.cost_b2c).as_decimal().unwrap_or_default(),
            is_b2b: snap.cell(idx, cols.is_b2b).as_i64().unwrap_or(0) != 0,
            cnt: snap.cell(idx, cols.cnt).as_u32().unwrap_or(0),
            pay_type: if pay_type.is_empty() { "-".to_string() } else { pay_type },
            total_cost: snap.cell(idx, cols.total_cost).as_decimal().unwrap_or_default(),
            is_canceled: snap.cell(idx, cols.is_canceled).display_text() == CANCELED_MARK,
        }
    }

    /// Encode the line in the persisted column order of the
    /// `PurchaseOrder` table.
    pub fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::text(self.serial_number.clone()),
            Cell::from(self.date),
            Cell::text(self.time.clone()),
            Cell::text(format!("{:04}", self.index)),
            Cell::text(self.code_num.clone()),
            Cell::text(self.name.clone()),
            Cell::text(self.description.clone()),
            Cell::from(self.cost_b2b),
            Cell::from(self.cost_b2c),
            Cell::Int(if self.is_b2b { 1 } else { 0 }),
            Cell::from(self.cnt),
            Cell::text(self.pay_type.clone()),
            Cell::from(self.total_cost),
            if self.is_canceled {
                Cell::text(CANCELED_MARK)
            } else {
                Cell::Empty
            },
        ]
    }
}

/// One memo row, addressed by its absolute row number.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    pub row_number: u32,
    pub date: u32,
    pub index: u32,
    pub content: String,
}

/// One revision-history row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub revision: String,
    pub author: String,
    pub date: String,
    pub description: String,
}

/// Inventory health bucket derived from the shortage counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(into = "u8", try_from = "u8")]
pub enum StockStatus {
    Critical,
    Warning,
    Normal,
}

impl StockStatus {
    pub fn classify(out_count: i64, low_count: i64) -> Self {
        if out_count > 0 {
            StockStatus::Critical
        } else if low_count > 0 {
            StockStatus::Warning
        } else {
            StockStatus::Normal
        }
    }
}

impl From<StockStatus> for u8 {
    fn from(status: StockStatus) -> u8 {
        match status {
            StockStatus::Critical => 0,
            StockStatus::Warning => 1,
            StockStatus::Normal => 2,
        }
    }
}

impl TryFrom<u8> for StockStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(StockStatus::Critical),
            1 => Ok(StockStatus::Warning),
            2 => Ok(StockStatus::Normal),
            other => Err(format!("unknown stock status {}", other)),
        }
    }
}

/// Reject an empty or whitespace-only text field.
pub fn require_content(value: &str, what: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::ValidationError(format!(
            "{} cannot be empty.",
            what
        )));
    }
    Ok(trimmed.to_string())
}
