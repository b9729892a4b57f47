//! Persisted order and order item records.

use chrono::{DateTime, Utc};
use common::{AddressId, OrderId, PaymentMethodId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use super::{OrderStatus, PlaceOrder};
use crate::pricing::{OrderTotals, PricedLine};
use crate::value_objects::Money;

/// An order row that has not been inserted yet (no id assigned).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: UserId,
    pub address_id: AddressId,
    pub payment_method_id: PaymentMethodId,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub totals: OrderTotals,
}

impl NewOrder {
    /// Builds the confirmed order row for a priced command.
    pub fn confirmed(cmd: &PlaceOrder, totals: OrderTotals, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id: cmd.user_id,
            address_id: cmd.address_id,
            payment_method_id: cmd.payment_method_id,
            created_at,
            status: OrderStatus::Confirmed,
            totals,
        }
    }

    /// Attaches the id assigned on insert.
    pub fn with_id(self, id: OrderId) -> Order {
        Order {
            id,
            user_id: self.user_id,
            address_id: self.address_id,
            payment_method_id: self.payment_method_id,
            created_at: self.created_at,
            status: self.status,
            subtotal: self.totals.subtotal,
            shipping_fee: self.totals.shipping_fee,
            discount_amount: self.totals.discount_amount,
            total_amount: self.totals.total,
        }
    }
}

/// A committed order. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub address_id: AddressId,
    pub payment_method_id: PaymentMethodId,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub discount_amount: Money,
    pub total_amount: Money,
}

impl Order {
    /// Returns the monetary summary of this order.
    pub fn totals(&self) -> OrderTotals {
        OrderTotals {
            subtotal: self.subtotal,
            shipping_fee: self.shipping_fee,
            discount_amount: self.discount_amount,
            total: self.total_amount,
        }
    }
}

/// A committed order line with its frozen unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
    pub quantity: u32,
    /// Unit price at the moment the order committed; later catalog changes never touch it.
    pub price_at_time: Money,
}

impl OrderItem {
    /// Builds the item row for a priced line of `order_id`.
    pub fn from_priced(order_id: OrderId, priced: &PricedLine) -> Self {
        Self {
            order_id,
            product_id: priced.line.product_id,
            size: priced.line.size.clone(),
            color: priced.line.color.clone(),
            quantity: priced.line.quantity,
            price_at_time: priced.unit_price,
        }
    }

    /// Returns `price_at_time * quantity`.
    pub fn line_total(&self) -> Money {
        self.price_at_time.multiply(self.quantity)
    }
}
