//! In-process domain events.
//!
//! Mutating services publish onto an mpsc channel; a background task
//! drains it and writes structured log lines. Event delivery is
//! best-effort and never blocks or fails a mutation.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Events emitted by the order and inventory services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCommitted {
        serial_number: String,
        line_count: usize,
    },
    OrderCanceled {
        serial_number: String,
        restored_lines: usize,
    },
    StockAdjusted {
        code_num: String,
        delta: i64,
        new_stock: i64,
    },
    AccessLogged {
        code_num: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Channel wired to a logging consumer, for tests and local runs.
    pub fn spawn_default() -> Self {
        let (tx, rx) = mpsc::channel(1024);
        tokio::spawn(process_events(rx));
        Self::new(tx)
    }

    /// Publish without blocking the caller; a full or closed channel
    /// is logged and dropped.
    pub fn publish(&self, event: Event) {
        if let Err(err) = self.sender.try_send(event) {
            warn!(error = %err, "failed to publish event");
        }
    }
}

/// Drain the event channel, logging each event.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OrderCommitted {
                serial_number,
                line_count,
            } => info!(serial_number = %serial_number, line_count, "order committed"),
            Event::OrderCanceled {
                serial_number,
                restored_lines,
            } => info!(serial_number = %serial_number, restored_lines, "order canceled"),
            Event::StockAdjusted {
                code_num,
                delta,
                new_stock,
            } => info!(code_num = %code_num, delta, new_stock, "stock adjusted"),
            Event::AccessLogged { code_num } => info!(code_num = %code_num, "access logged"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_is_non_blocking() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        sender.publish(Event::OrderCommitted {
            serial_number: "202501150001".into(),
            line_count: 2,
        });
        let received = rx.recv().await.unwrap();
        assert!(matches!(received, Event::OrderCommitted { line_count: 2, .. }));
    }

    #[tokio::test]
    async fn closed_channel_does_not_panic() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        sender.publish(Event::AccessLogged {
            code_num: "CODE1".into(),
        });
    }
}
