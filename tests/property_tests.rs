//! Property tests over the order engine: stock arithmetic and index
//! assignment hold for arbitrary submission sequences.

mod common;

use proptest::prelude::*;
use std::sync::Arc;

use common::{item_row, ITEM_HEADERS, ORDER_HEADERS};
use stockroom_api::cache::AppCache;
use stockroom_api::events::EventSender;
use stockroom_api::models::tables;
use stockroom_api::services::inventory::InventoryService;
use stockroom_api::services::orders::{CreateOrderRequest, OrderLineRequest, OrderService};
use stockroom_api::services::sequencer::OrderSequencer;
use stockroom_api::store::{InMemoryStore, TabularStore};

#[derive(Debug, Clone)]
struct Submission {
    item: usize,
    cnt: u32,
    cancel: bool,
}

fn submission_strategy() -> impl Strategy<Value = Vec<Submission>> {
    prop::collection::vec(
        (0usize..2, 1u32..8, prop::bool::ANY).prop_map(|(item, cnt, cancel)| Submission {
            item,
            cnt,
            cancel,
        }),
        1..12,
    )
}

fn build_service(stocks: [i64; 2]) -> (OrderService, InventoryService) {
    let store: Arc<dyn TabularStore> = Arc::new(
        InMemoryStore::new()
            .with_table(
                tables::ITEM_INFO,
                &ITEM_HEADERS,
                vec![
                    item_row(1, "Widget", "CODE1", stocks[0]),
                    item_row(2, "Gadget", "CODE2", stocks[1]),
                ],
            )
            .with_table(tables::PURCHASE_ORDER, &ORDER_HEADERS, vec![]),
    );
    let events = EventSender::spawn_default();
    let inventory = InventoryService::new(store.clone(), events.clone());
    let sequencer = OrderSequencer::new(store.clone());
    let orders = OrderService::new(
        store,
        AppCache::in_memory(),
        events,
        inventory.clone(),
        sequencer,
    );
    (orders, inventory)
}

fn one_line(date: u32, code: &str, cnt: u32) -> CreateOrderRequest {
    CreateOrderRequest {
        date,
        pay_type: None,
        lines: vec![OrderLineRequest {
            code_num: code.into(),
            cnt,
            is_b2b: false,
        }],
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Stock never goes negative, committed quantities add up, and a
    /// canceled order hands its quantity back.
    #[test]
    fn stock_accounting_is_exact(submissions in submission_strategy()) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let initial = [20i64, 15i64];
            let codes = ["CODE1", "CODE2"];
            let (orders, inventory) = build_service(initial);
            let mut outstanding = [0i64; 2];

            for submission in &submissions {
                let code = codes[submission.item];
                let before = inventory.find_by_code(code).await.unwrap().stock_num;
                let result = orders
                    .create_order(one_line(20250115, code, submission.cnt))
                    .await;

                match result {
                    Ok(commit) => {
                        let after = inventory.find_by_code(code).await.unwrap().stock_num;
                        prop_assert_eq!(after, before - submission.cnt as i64);
                        prop_assert!(after >= 0);
                        outstanding[submission.item] += submission.cnt as i64;

                        if submission.cancel {
                            orders.cancel_order(&commit.order_serial_number).await.unwrap();
                            let restored = inventory.find_by_code(code).await.unwrap().stock_num;
                            prop_assert_eq!(restored, before);
                            outstanding[submission.item] -= submission.cnt as i64;
                        }
                    }
                    Err(err) => {
                        // Only a stock shortfall may reject a line here,
                        // and it must reject without any stock change.
                        prop_assert_eq!(err.code(), "insufficient_stock");
                        let after = inventory.find_by_code(code).await.unwrap().stock_num;
                        prop_assert_eq!(after, before);
                        prop_assert!(before < submission.cnt as i64);
                    }
                }
            }

            for (i, code) in codes.iter().enumerate() {
                let stock = inventory.find_by_code(code).await.unwrap().stock_num;
                prop_assert_eq!(stock, initial[i] - outstanding[i]);
            }
            Ok(())
        })?;
    }

    /// Serial indexes for a date are strictly increasing from 1 with
    /// no reuse, including across cancellations.
    #[test]
    fn indexes_are_strictly_increasing(submissions in submission_strategy()) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let (orders, _) = build_service([1_000, 1_000]);
            let codes = ["CODE1", "CODE2"];
            let mut expected = 1u32;

            for submission in &submissions {
                let commit = orders
                    .create_order(one_line(20250115, codes[submission.item], submission.cnt))
                    .await
                    .unwrap();
                let serial = commit.order_serial_number;
                let index: u32 = serial[8..].parse().unwrap();
                prop_assert_eq!(index, expected);
                if submission.cancel {
                    orders.cancel_order(&serial).await.unwrap();
                }
                expected += 1;
            }
            Ok(())
        })?;
    }
}
