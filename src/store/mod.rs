//! Tabular store boundary.
//!
//! The backing storage engine is row-oriented: named tables, a header
//! row defining columns by name, and cell-level updates. Everything
//! above this module talks to [`TabularStore`] only, so the engine can
//! be swapped (spreadsheet service, key-value store, SQL) without
//! touching the transaction logic.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod memory;

pub use memory::InMemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table not found: {0}")]
    TableNotFound(String),
    #[error("column {column} missing from table {table}")]
    ColumnMissing { table: String, column: String },
    #[error("row {row} out of range in table {table}")]
    RowOutOfRange { table: String, row: u32 },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// One cell of a table. The store itself is loosely typed; values are
/// tagged here and decoded into domain types at the model boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Int(i64),
    Number(Decimal),
    Text(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Int(v) => Some(*v),
            Cell::Number(d) => d.to_i64(),
            Cell::Text(s) => s.trim().parse().ok(),
            Cell::Empty => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        self.as_i64().and_then(|v| u32::try_from(v).ok())
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Cell::Int(v) => Some(Decimal::from(*v)),
            Cell::Number(d) => Some(*d),
            Cell::Text(s) => Decimal::from_str(s.trim()).ok(),
            Cell::Empty => None,
        }
    }

    /// The cell rendered the way the store would display it.
    pub fn display_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Int(v) => v.to_string(),
            Cell::Number(d) => d.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Int(v)
    }
}

impl From<u32> for Cell {
    fn from(v: u32) -> Self {
        Cell::Int(v as i64)
    }
}

impl From<Decimal> for Cell {
    fn from(v: Decimal) -> Self {
        Cell::Number(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_string())
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::Text(v)
    }
}

/// Point-in-time copy of a table: header row plus data rows.
///
/// Row numbers follow the store convention: 1-based, row 1 is the
/// header, data starts at row 2. `rows[0]` therefore corresponds to
/// row number 2, which is what `row_number` computes.
#[derive(Debug, Clone)]
pub struct TableSnapshot {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl TableSnapshot {
    /// Resolve a column name to its index.
    pub fn column(&self, name: &str) -> Result<usize, StoreError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| StoreError::ColumnMissing {
                table: self.name.clone(),
                column: name.to_string(),
            })
    }

    /// Absolute row number of the data row at `data_idx`.
    pub fn row_number(&self, data_idx: usize) -> u32 {
        data_idx as u32 + 2
    }

    pub fn cell(&self, data_idx: usize, col: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.rows
            .get(data_idx)
            .and_then(|row| row.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Row-level access to the backing tables.
///
/// The store serializes individual cell and row operations but offers
/// no cross-row atomicity; multi-row consistency is the caller's
/// problem (see the order transaction engine).
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Read the whole table: header row plus data rows.
    async fn snapshot(&self, table: &str) -> Result<TableSnapshot, StoreError>;

    /// Append one data row. Returns the absolute row number written.
    async fn append_row(&self, table: &str, row: Vec<Cell>) -> Result<u32, StoreError>;

    /// Overwrite one cell. `row` is the absolute 1-based row number
    /// (row 1 is the header), `col` the 0-based column index.
    async fn update_cell(&self, table: &str, row: u32, col: usize, value: Cell)
        -> Result<(), StoreError>;

    /// Read one cell with the same addressing as `update_cell`.
    async fn read_cell(&self, table: &str, row: u32, col: usize) -> Result<Cell, StoreError>;

    /// Physically remove a data row. Only the memo table uses this;
    /// order rows are never deleted.
    async fn delete_row(&self, table: &str, row: u32) -> Result<(), StoreError>;

    /// Create the table with the given header row if it does not
    /// exist yet. Returns true when it was created.
    async fn ensure_table(&self, table: &str, headers: &[&str]) -> Result<bool, StoreError>;
}
