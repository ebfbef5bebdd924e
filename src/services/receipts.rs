//! Receipt generation for committed orders.
//!
//! The engine only assembles page data: it splits an order's lines
//! into fixed-size pages and computes the VAT breakdown per line.
//! Rendering and storage belong to the [`ReceiptExporter`]
//! collaborator; the bundled implementation writes page JSON into the
//! configured output folder. Pages are exported with a fixed delay in
//! between so the export endpoint is not hammered.

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::common::{dotted_date, short_dotted_date};
use crate::errors::ServiceError;
use crate::models::OrderLine;
use crate::services::orders::OrderService;

/// Lines per receipt page.
const LINES_PER_PAGE: usize = 11;

/// Delay between page exports.
pub const PAGE_EXPORT_DELAY: Duration = Duration::from_millis(500);

const FILE_PREFIX: &str = "거래명세표";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    /// Item name, with the description in parentheses when present
    pub item_text: String,
    pub cnt: u32,
    /// Unit price excluding VAT (90 % of the tier price)
    pub unit_price_ex_vat: Decimal,
    /// VAT portion (10 % of the tier price)
    pub vat: Decimal,
    /// Tier price times quantity
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptPage {
    pub order_serial_number: String,
    /// `2025.01.15`
    pub date_full: String,
    /// `01.15`, repeated on each line row
    pub date_short: String,
    pub page_number: usize,
    pub page_count: usize,
    pub page_total: Decimal,
    pub lines: Vec<ReceiptLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportedReceipt {
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptBundle {
    pub files: Vec<ExportedReceipt>,
    pub count: usize,
}

/// Renders and stores one receipt page. External collaborator; the
/// core never knows where pages end up.
#[async_trait]
pub trait ReceiptExporter: Send + Sync {
    async fn export(
        &self,
        page: &ReceiptPage,
        file_name: &str,
    ) -> Result<ExportedReceipt, ServiceError>;
}

/// Writes receipt pages as JSON documents into a local folder.
pub struct JsonFileExporter {
    dir: PathBuf,
}

impl JsonFileExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ReceiptExporter for JsonFileExporter {
    async fn export(
        &self,
        page: &ReceiptPage,
        file_name: &str,
    ) -> Result<ExportedReceipt, ServiceError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ServiceError::ExportError(format!("creating output folder: {}", e)))?;

        let path = self.dir.join(file_name);
        let body = serde_json::to_vec_pretty(page)?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| ServiceError::ExportError(format!("writing {}: {}", file_name, e)))?;

        Ok(ExportedReceipt {
            name: file_name.to_string(),
            location: path.display().to_string(),
        })
    }
}

fn round_won(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

fn receipt_line(line: &OrderLine) -> ReceiptLine {
    let item_text = if line.description.trim().is_empty() {
        line.name.clone()
    } else {
        format!("{} ({})", line.name, line.description)
    };
    let tier_price = if line.is_b2b {
        line.cost_b2b
    } else {
        line.cost_b2c
    };
    ReceiptLine {
        item_text,
        cnt: line.cnt,
        unit_price_ex_vat: round_won(tier_price * dec!(0.9)),
        vat: round_won(tier_price * dec!(0.1)),
        line_total: tier_price * Decimal::from(line.cnt),
    }
}

/// Split an order's lines into receipt pages.
pub fn paginate(serial_number: &str, date: u32, lines: &[OrderLine]) -> Vec<ReceiptPage> {
    let chunks: Vec<&[OrderLine]> = lines.chunks(LINES_PER_PAGE).collect();
    let page_count = chunks.len();

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let lines: Vec<ReceiptLine> = chunk.iter().map(receipt_line).collect();
            let page_total = lines.iter().map(|l| l.line_total).sum();
            ReceiptPage {
                order_serial_number: serial_number.to_string(),
                date_full: dotted_date(date),
                date_short: short_dotted_date(date),
                page_number: i + 1,
                page_count,
                page_total,
                lines,
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct ReceiptService {
    orders: OrderService,
    exporter: Arc<dyn ReceiptExporter>,
    page_delay: Duration,
}

impl ReceiptService {
    pub fn new(orders: OrderService, exporter: Arc<dyn ReceiptExporter>) -> Self {
        Self::with_page_delay(orders, exporter, PAGE_EXPORT_DELAY)
    }

    pub fn with_page_delay(
        orders: OrderService,
        exporter: Arc<dyn ReceiptExporter>,
        page_delay: Duration,
    ) -> Self {
        Self {
            orders,
            exporter,
            page_delay,
        }
    }

    /// Build and export every page of the order's receipt.
    #[instrument(skip(self))]
    pub async fn generate(&self, serial_number: &str) -> Result<ReceiptBundle, ServiceError> {
        let lines = self.orders.order_lines(serial_number).await?;
        let date = lines.first().map(|l| l.date).unwrap_or(0);
        let pages = paginate(serial_number, date, &lines);
        let multi_page = pages.len() > 1;

        let mut files = Vec::with_capacity(pages.len());
        for page in &pages {
            let suffix = if multi_page {
                format!("_{}", page.page_number)
            } else {
                String::new()
            };
            let file_name = format!("{}_{}{}.pdf", FILE_PREFIX, serial_number, suffix);
            files.push(self.exporter.export(page, &file_name).await?);

            if page.page_number < page.page_count && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        info!(serial_number, pages = files.len(), "receipt exported");
        Ok(ReceiptBundle {
            count: files.len(),
            files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(name: &str, desc: &str, cnt: u32, b2c: Decimal, is_b2b: bool) -> OrderLine {
        OrderLine {
            serial_number: "202501150001".into(),
            date: 20250115,
            time: "2025-01-15 10:00:00".into(),
            index: 1,
            code_num: "CODE1".into(),
            name: name.into(),
            description: desc.into(),
            cost_b2b: b2c * dec!(0.9),
            cost_b2c: b2c,
            is_b2b,
            cnt,
            pay_type: "카드".into(),
            total_cost: b2c * Decimal::from(cnt),
            is_canceled: false,
        }
    }

    #[test]
    fn single_page_totals_and_vat() {
        let lines = vec![line("Widget", "blue", 3, dec!(1000), false)];
        let pages = paginate("202501150001", 20250115, &lines);
        assert_eq!(pages.len(), 1);

        let page = &pages[0];
        assert_eq!(page.date_full, "2025.01.15");
        assert_eq!(page.date_short, "01.15");
        assert_eq!(page.page_total, dec!(3000));

        let l = &page.lines[0];
        assert_eq!(l.item_text, "Widget (blue)");
        assert_eq!(l.unit_price_ex_vat, dec!(900));
        assert_eq!(l.vat, dec!(100));
        assert_eq!(l.line_total, dec!(3000));
    }

    #[test]
    fn vat_rounding_is_half_up() {
        let lines = vec![line("Odd", "", 1, dec!(1015), false)];
        let pages = paginate("202501150001", 20250115, &lines);
        let l = &pages[0].lines[0];
        // 1015 * 0.9 = 913.5 -> 914, 1015 * 0.1 = 101.5 -> 102
        assert_eq!(l.unit_price_ex_vat, dec!(914));
        assert_eq!(l.vat, dec!(102));
    }

    #[test]
    fn twelve_lines_split_into_two_pages() {
        let lines: Vec<OrderLine> = (0..12)
            .map(|i| line(&format!("Item{}", i), "", 1, dec!(1000), false))
            .collect();
        let pages = paginate("202501150001", 20250115, &lines);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].lines.len(), 11);
        assert_eq!(pages[1].lines.len(), 1);
        assert_eq!(pages[0].page_count, 2);
        assert_eq!(pages[1].page_number, 2);
        assert_eq!(pages[0].page_total, dec!(11000));
        assert_eq!(pages[1].page_total, dec!(1000));
    }

    #[test]
    fn description_free_lines_use_bare_name() {
        let lines = vec![line("Widget", "  ", 1, dec!(1000), false)];
        let pages = paginate("202501150001", 20250115, &lines);
        assert_eq!(pages[0].lines[0].item_text, "Widget");
    }
}
