//! Domain layer for the order service.
//!
//! This crate provides the storage-independent pieces of order placement:
//! - Money and variant value objects
//! - Catalog records read by the workflow
//! - The pricing engine (discounted unit prices, order totals)
//! - The `PlaceOrder` command and persisted order records
//! - Confirmation messages handed to the notification queue

pub mod catalog;
pub mod error;
pub mod notification;
pub mod order;
pub mod pricing;
pub mod value_objects;

pub use catalog::{Category, Product, ProductSummary};
pub use error::DomainError;
pub use notification::NotificationMessage;
pub use order::{
    MAX_LINE_QUANTITY, NewOrder, Order, OrderItem, OrderLine, OrderStatus, PlaceOrder,
};
pub use pricing::{OrderTotals, PricedLine, PricingEngine, SHIPPING_FEE, unit_price};
pub use value_objects::{DiscountPercent, Money, VariantKey};
