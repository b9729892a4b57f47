//! The order placement workflow.

use std::time::Instant;

use chrono::Utc;
use domain::{
    NewOrder, NotificationMessage, Order, OrderItem, OrderTotals, PlaceOrder, PricedLine,
    PricingEngine,
};
use serde::Serialize;
use store::{Storage, StoreTransaction};

use crate::error::{Result, WorkflowError};
use crate::notification::NotificationQueue;
use crate::state::WorkflowState;

/// Outcome of a committed order placement.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub totals: OrderTotals,
    pub final_state: WorkflowState,
    /// False when the buyer could not be looked up or the queue was closed.
    pub notification_queued: bool,
}

/// Runs order placements against a storage backend.
///
/// Each call to [`place_order`](OrderWorkflow::place_order) is independent
/// and owns its own transaction, so one workflow value serves any number of
/// concurrent requests.
pub struct OrderWorkflow<S: Storage> {
    store: S,
    pricing: PricingEngine,
    notifications: NotificationQueue,
}

impl<S: Storage> OrderWorkflow<S> {
    /// Creates a new workflow.
    pub fn new(store: S, pricing: PricingEngine, notifications: NotificationQueue) -> Self {
        Self {
            store,
            pricing,
            notifications,
        }
    }

    /// Returns the storage backend.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places an order atomically.
    ///
    /// Either the order, all of its items and every stock decrement commit
    /// together, or nothing is written and the originating error is
    /// returned. After a commit the confirmation is queued; failing to do so
    /// is logged and does not fail the call.
    #[tracing::instrument(skip(self, cmd), fields(user_id = %cmd.user_id, lines = cmd.lines.len()))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<PlacedOrder> {
        let started = Instant::now();
        let mut state = WorkflowState::default();

        let result = self.execute(&cmd, &mut state).await;
        metrics::histogram!("order_workflow_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        let (order, items, totals) = match result {
            Ok(committed) => committed,
            Err(e) => {
                let failed_in = state;
                transition(&mut state, WorkflowState::Aborted);
                metrics::counter!("orders_aborted_total", "reason" => e.reason()).increment(1);
                tracing::warn!(stage = %failed_in, error = %e, "order aborted");
                return Err(e);
            }
        };

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(order_id = %order.id, total = %order.total_amount, "order committed");

        let notification_queued = match self.notify(&order).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "confirmation not queued");
                false
            }
        };

        Ok(PlacedOrder {
            order,
            items,
            totals,
            final_state: state,
            notification_queued,
        })
    }

    async fn execute(
        &self,
        cmd: &PlaceOrder,
        state: &mut WorkflowState,
    ) -> Result<(Order, Vec<OrderItem>, OrderTotals)> {
        cmd.validate()?;

        let mut tx = self.store.begin().await?;
        match self.apply(&mut tx, cmd, state).await {
            Ok((order, items, totals)) => {
                tx.commit().await?;
                transition(state, WorkflowState::Committed);
                Ok((order, items, totals))
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Runs every stage inside `tx`, leaving the commit to the caller.
    async fn apply(
        &self,
        tx: &mut S::Transaction,
        cmd: &PlaceOrder,
        state: &mut WorkflowState,
    ) -> Result<(Order, Vec<OrderItem>, OrderTotals)> {
        let mut products = Vec::with_capacity(cmd.lines.len());
        for line in &cmd.lines {
            let product = tx
                .find_product(line.product_id)
                .await?
                .ok_or(WorkflowError::ProductNotFound(line.product_id))?;
            products.push(product);
        }

        // Each line is priced exactly once; the same value feeds the subtotal
        // and the persisted price_at_time.
        transition(state, WorkflowState::Pricing);
        let priced: Vec<PricedLine> = cmd
            .lines
            .iter()
            .zip(&products)
            .map(|(line, product)| self.pricing.price_line(product, line.clone()))
            .collect();
        let totals = self.pricing.totals(&priced)?;

        transition(state, WorkflowState::Reserving);
        for line in reservation_order(&priced) {
            tx.reserve_stock(&line.line.variant(), line.line.quantity)
                .await?;
        }

        transition(state, WorkflowState::Persisting);
        let order = tx
            .insert_order(NewOrder::confirmed(cmd, totals, Utc::now()))
            .await?;

        let mut items = Vec::with_capacity(priced.len());
        for line in &priced {
            let item = OrderItem::from_priced(order.id, line);
            tx.insert_order_item(&item).await?;
            items.push(item);
        }

        Ok((order, items, totals))
    }

    async fn notify(&self, order: &Order) -> Result<()> {
        let email = self
            .store
            .find_user_email(order.user_id)
            .await
            .map_err(|e| WorkflowError::NotificationFailure(e.to_string()))?
            .ok_or_else(|| {
                WorkflowError::NotificationFailure(format!("no buyer with id {}", order.user_id))
            })?;

        self.notifications.enqueue(NotificationMessage::order_confirmation(
            order.id,
            email,
            order.total_amount,
        ))
    }
}

/// Lines sorted by variant key, so that concurrent orders lock inventory
/// rows in the same order regardless of how their carts were listed.
fn reservation_order(priced: &[PricedLine]) -> Vec<&PricedLine> {
    let mut lines: Vec<&PricedLine> = priced.iter().collect();
    lines.sort_by_cached_key(|line| line.line.variant());
    lines
}

fn transition(state: &mut WorkflowState, to: WorkflowState) {
    debug_assert!(state.can_transition_to(to), "{state} -> {to}");
    tracing::debug!(from = %state, %to, "workflow transition");
    *state = to;
}
