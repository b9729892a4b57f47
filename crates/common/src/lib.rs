//! Shared identifiers and startup utilities for the order service.

pub mod types;
pub mod wait;

pub use types::{AddressId, CategoryId, OrderId, PaymentMethodId, ProductId, UserId};
pub use wait::{WaitError, WaitPolicy, wait_for};
