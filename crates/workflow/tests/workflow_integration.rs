//! Integration tests for order placement against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use common::{AddressId, OrderId, PaymentMethodId, ProductId, UserId};
use domain::{DiscountPercent, Money, OrderLine, OrderStatus, PlaceOrder, PricingEngine, ProductSummary, VariantKey};
use futures_util::future::join_all;
use store::{InMemoryStore, Storage};
use tokio::task::JoinHandle;
use workflow::{NotificationQueue, OrderWorkflow, RecordingDeliverer, WorkflowError, WorkflowState};

struct TestHarness {
    workflow: OrderWorkflow<InMemoryStore>,
    store: InMemoryStore,
    deliverer: RecordingDeliverer,
    delivery: JoinHandle<()>,
}

impl TestHarness {
    /// Buyer 1 plus product 1 (10000 minor units, 10% off) with 5 units of M/red
    /// and product 2 (5000 minor units, no discount) with 10 units of 42/black.
    async fn new() -> Self {
        let store = InMemoryStore::new();
        store.add_user(UserId::new(1), "buyer@example.com").await;
        store.add_product(product(1, "Runner", 10_000, 10)).await;
        store.add_product(product(2, "Sandal", 5_000, 0)).await;
        store.set_stock(variant(1, "M", "red"), 5).await;
        store.set_stock(variant(2, "42", "black"), 10).await;

        let deliverer = RecordingDeliverer::new();
        let (queue, delivery) = NotificationQueue::spawn(deliverer.clone(), Duration::ZERO);
        let workflow = OrderWorkflow::new(store.clone(), PricingEngine::default(), queue);

        Self {
            workflow,
            store,
            deliverer,
            delivery,
        }
    }

    async fn stock(&self, product_id: i64, size: &str, color: &str) -> Option<u32> {
        self.store
            .stock_level(&variant(product_id, size, color))
            .await
            .unwrap()
    }

    /// Drops the workflow (and with it the queue handle) and waits for delivery to drain.
    async fn drain(self) -> RecordingDeliverer {
        drop(self.workflow);
        self.delivery.await.unwrap();
        self.deliverer
    }
}

fn product(id: i64, name: &str, base_price: i64, discount: i64) -> ProductSummary {
    ProductSummary {
        product_id: ProductId::new(id),
        name: name.to_string(),
        description: None,
        base_price: Money::from_minor(base_price),
        discount_percent: DiscountPercent::new(discount).unwrap(),
        brand: None,
        model: None,
        category_id: None,
    }
}

fn variant(product_id: i64, size: &str, color: &str) -> VariantKey {
    VariantKey::new(ProductId::new(product_id), size, color)
}

fn place(user_id: i64, lines: Vec<OrderLine>) -> PlaceOrder {
    PlaceOrder::new(
        UserId::new(user_id),
        AddressId::new(1),
        PaymentMethodId::new(1),
        lines,
    )
}

fn line(product_id: i64, size: &str, color: &str, quantity: u32) -> OrderLine {
    OrderLine::new(ProductId::new(product_id), size, color, quantity)
}

#[tokio::test]
async fn test_order_commits_and_second_order_is_rejected() {
    let harness = TestHarness::new().await;

    let placed = harness
        .workflow
        .place_order(place(1, vec![line(1, "M", "red", 3)]))
        .await
        .unwrap();

    assert_eq!(placed.final_state, WorkflowState::Committed);
    assert_eq!(placed.order.status, OrderStatus::Confirmed);
    assert_eq!(placed.items[0].price_at_time.minor(), 9_000);
    assert_eq!(placed.order.subtotal.minor(), 27_000);
    assert_eq!(placed.order.shipping_fee.minor(), 30_000);
    assert_eq!(placed.order.total_amount.minor(), 57_000);
    assert_eq!(harness.stock(1, "M", "red").await, Some(2));

    let err = harness
        .workflow
        .place_order(place(1, vec![line(1, "M", "red", 3)]))
        .await
        .unwrap_err();

    match err {
        WorkflowError::InsufficientStock {
            product_id,
            requested,
            ..
        } => {
            assert_eq!(product_id, ProductId::new(1));
            assert_eq!(requested, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(harness.stock(1, "M", "red").await, Some(2));
    assert_eq!(harness.store.order_count().await, 1);
}

#[tokio::test]
async fn test_persisted_items_reproduce_subtotal() {
    let harness = TestHarness::new().await;

    let placed = harness
        .workflow
        .place_order(place(
            1,
            vec![line(1, "M", "red", 2), line(2, "42", "black", 3)],
        ))
        .await
        .unwrap();

    let items = harness
        .store
        .get_order_items(placed.order.id)
        .await
        .unwrap();
    let sum: Money = items.iter().map(|item| item.line_total()).sum();

    assert_eq!(items.len(), 2);
    assert_eq!(sum, placed.order.subtotal);
    assert_eq!(sum.minor(), 2 * 9_000 + 3 * 5_000);
    assert_eq!(
        placed.order.total_amount,
        placed.order.subtotal + placed.order.shipping_fee - placed.order.discount_amount
    );
}

#[tokio::test]
async fn test_concurrent_orders_never_oversell() {
    let harness = TestHarness::new().await;
    let workflow = Arc::new(harness.workflow);

    let attempts = (0..7).map(|_| {
        let workflow = workflow.clone();
        tokio::spawn(async move {
            workflow
                .place_order(place(1, vec![line(1, "M", "red", 2)]))
                .await
        })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 2);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, WorkflowError::InsufficientStock { .. }))
    );
    assert_eq!(
        harness
            .store
            .stock_level(&variant(1, "M", "red"))
            .await
            .unwrap(),
        Some(1)
    );
    assert_eq!(harness.store.order_count().await, 2);
}

#[tokio::test]
async fn test_unknown_product_commits_nothing() {
    let harness = TestHarness::new().await;

    let err = harness
        .workflow
        .place_order(place(
            1,
            vec![line(1, "M", "red", 1), line(999, "M", "red", 1)],
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::ProductNotFound(id) if id == ProductId::new(999)));
    assert_eq!(harness.store.order_count().await, 0);
    assert_eq!(harness.stock(1, "M", "red").await, Some(5));
}

#[tokio::test]
async fn test_one_short_line_rolls_back_the_others() {
    let harness = TestHarness::new().await;

    let err = harness
        .workflow
        .place_order(place(
            1,
            vec![line(2, "42", "black", 4), line(1, "M", "red", 6)],
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::InsufficientStock { .. }));
    assert_eq!(harness.stock(2, "42", "black").await, Some(10));
    assert_eq!(harness.stock(1, "M", "red").await, Some(5));
    assert_eq!(harness.store.order_count().await, 0);
}

#[tokio::test]
async fn test_unknown_variant_is_insufficient_stock() {
    let harness = TestHarness::new().await;

    let err = harness
        .workflow
        .place_order(place(1, vec![line(1, "XL", "red", 1)]))
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::InsufficientStock { ref size, .. } if size == "XL"));
}

#[tokio::test]
async fn test_item_write_failure_rolls_back_everything() {
    let harness = TestHarness::new().await;
    harness.store.set_fail_on_insert_item(true).await;

    let err = harness
        .workflow
        .place_order(place(1, vec![line(1, "M", "red", 2)]))
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::PersistenceFailure(_)));
    assert_eq!(harness.store.order_count().await, 0);
    assert_eq!(harness.store.order_item_count().await, 0);
    assert_eq!(harness.stock(1, "M", "red").await, Some(5));
}

#[tokio::test]
async fn test_empty_order_is_rejected_without_writes() {
    let harness = TestHarness::new().await;

    let err = harness
        .workflow
        .place_order(place(1, vec![]))
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::InvalidRequest(_)));
    assert_eq!(harness.store.order_count().await, 0);
}

#[tokio::test]
async fn test_missing_buyer_still_confirms_order() {
    let harness = TestHarness::new().await;

    let placed = harness
        .workflow
        .place_order(place(42, vec![line(1, "M", "red", 1)]))
        .await
        .unwrap();

    assert_eq!(placed.final_state, WorkflowState::Committed);
    assert!(!placed.notification_queued);
    assert!(
        harness
            .store
            .get_order(placed.order.id)
            .await
            .unwrap()
            .is_some()
    );

    let deliverer = harness.drain().await;
    assert_eq!(deliverer.delivered_count(), 0);
}

#[tokio::test]
async fn test_confirmations_follow_commit_order() {
    let harness = TestHarness::new().await;

    let mut order_ids = Vec::new();
    for _ in 0..3 {
        let placed = harness
            .workflow
            .place_order(place(1, vec![line(2, "42", "black", 1)]))
            .await
            .unwrap();
        assert!(placed.notification_queued);
        order_ids.push(placed.order.id);
    }

    let deliverer = harness.drain().await;
    let delivered: Vec<OrderId> = deliverer.delivered().iter().map(|m| m.order_id).collect();
    assert_eq!(delivered, order_ids);

    let first = &deliverer.delivered()[0];
    assert_eq!(first.to, "buyer@example.com");
    assert_eq!(first.subject, format!("Order Confirmation #{}", order_ids[0]));
    assert_eq!(
        first.body,
        format!("Thank you for your order #{}. Total: 350.00", order_ids[0])
    );
}

#[tokio::test]
async fn test_concurrent_confirmations_follow_enqueue_order() {
    let harness = TestHarness::new().await;
    let workflow = Arc::new(harness.workflow);
    let committed = Arc::new(std::sync::Mutex::new(Vec::new()));

    // On the single-threaded test runtime nothing yields between the enqueue
    // at the end of place_order and the push below.
    let attempts = (0..8).map(|i| {
        let workflow = Arc::clone(&workflow);
        let committed = Arc::clone(&committed);
        tokio::spawn(async move {
            let cart = if i % 2 == 0 {
                vec![line(2, "42", "black", 1)]
            } else {
                vec![line(2, "42", "black", 1), line(1, "M", "red", 1)]
            };
            let placed = workflow.place_order(place(1, cart)).await.unwrap();
            assert!(placed.notification_queued);
            committed.lock().unwrap().push(placed.order.id);
        })
    });
    for joined in join_all(attempts).await {
        joined.unwrap();
    }

    let workflow = Arc::into_inner(workflow).expect("all tasks finished");
    drop(workflow);
    harness.delivery.await.unwrap();

    let delivered: Vec<OrderId> = harness
        .deliverer
        .delivered()
        .iter()
        .map(|m| m.order_id)
        .collect();
    assert_eq!(delivered.len(), 8);
    assert_eq!(delivered, *committed.lock().unwrap());
}

#[tokio::test]
async fn test_oversized_quantity_is_rejected_without_writes() {
    let harness = TestHarness::new().await;
    harness
        .store
        .add_product(product(7, "Gold Runner", 3_000_000_000, 0))
        .await;
    harness.store.set_stock(variant(7, "M", "red"), 1).await;

    let err = harness
        .workflow
        .place_order(place(1, vec![line(7, "M", "red", 4_000_000_000)]))
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::InvalidRequest(_)));
    assert_eq!(harness.store.order_count().await, 0);
    assert_eq!(harness.stock(7, "M", "red").await, Some(1));
}

#[tokio::test]
async fn test_overflowing_subtotal_is_rejected_without_writes() {
    let harness = TestHarness::new().await;
    harness
        .store
        .add_product(product(7, "Gold Runner", i64::MAX / 4, 0))
        .await;
    harness.store.set_stock(variant(7, "M", "red"), 10).await;

    let err = harness
        .workflow
        .place_order(place(
            1,
            vec![line(1, "M", "red", 1), line(7, "M", "red", 5)],
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::InvalidRequest(ref msg) if msg.contains("overflow")));
    assert_eq!(harness.store.order_count().await, 0);
    assert_eq!(harness.stock(1, "M", "red").await, Some(5));
    assert_eq!(harness.stock(7, "M", "red").await, Some(10));
}

#[tokio::test]
async fn test_price_change_does_not_touch_committed_items() {
    let harness = TestHarness::new().await;

    let placed = harness
        .workflow
        .place_order(place(1, vec![line(1, "M", "red", 1)]))
        .await
        .unwrap();
    assert!(
        harness
            .store
            .set_base_price(ProductId::new(1), Money::from_minor(20_000))
            .await
    );

    let items = harness
        .store
        .get_order_items(placed.order.id)
        .await
        .unwrap();
    assert_eq!(items[0].price_at_time.minor(), 9_000);
}
