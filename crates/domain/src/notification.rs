//! Post-commit confirmation messages.

use common::OrderId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::Money;

/// A confirmation to deliver once an order has committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// Correlates enqueue and delivery log lines.
    pub id: Uuid,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub order_id: OrderId,
}

impl NotificationMessage {
    /// Builds the order confirmation sent to the buyer.
    pub fn order_confirmation(order_id: OrderId, to: impl Into<String>, total: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            to: to.into(),
            subject: format!("Order Confirmation #{order_id}"),
            body: format!("Thank you for your order #{order_id}. Total: {total}"),
            order_id,
        }
    }
}
