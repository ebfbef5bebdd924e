//! Append-only access log for barcode scans.

use std::sync::Arc;
use tracing::instrument;

use crate::common::now_time_string;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::tables;
use crate::store::{Cell, TabularStore};

const ACCESS_LOG_HEADERS: [&str; 3] = ["Access_IP", "Time", "Scanned_CodeNum"];

#[derive(Clone)]
pub struct AccessLogService {
    store: Arc<dyn TabularStore>,
    events: EventSender,
}

impl AccessLogService {
    pub fn new(store: Arc<dyn TabularStore>, events: EventSender) -> Self {
        Self { store, events }
    }

    /// Record one scan. The log table is created on first use.
    #[instrument(skip(self))]
    pub async fn log_access(&self, code_num: &str, client_ip: &str) -> Result<(), ServiceError> {
        self.store
            .ensure_table(tables::ACCESS_LOG, &ACCESS_LOG_HEADERS)
            .await?;
        self.store
            .append_row(
                tables::ACCESS_LOG,
                vec![
                    Cell::text(client_ip),
                    Cell::text(now_time_string()),
                    Cell::text(code_num),
                ],
            )
            .await?;

        self.events.publish(Event::AccessLogged {
            code_num: code_num.to_string(),
        });
        Ok(())
    }
}
