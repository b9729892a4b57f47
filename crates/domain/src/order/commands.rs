//! Order placement command.

use common::{AddressId, PaymentMethodId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::VariantKey;

/// Largest quantity a single line may request; stock and item quantities
/// are stored as 32-bit signed integers.
pub const MAX_LINE_QUANTITY: u32 = i32::MAX as u32;

/// One requested cart line: a quantity of a specific product variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
    pub quantity: u32,
}

impl OrderLine {
    /// Creates a new order line.
    pub fn new(
        product_id: ProductId,
        size: impl Into<String>,
        color: impl Into<String>,
        quantity: u32,
    ) -> Self {
        Self {
            product_id,
            size: size.into(),
            color: color.into(),
            quantity,
        }
    }

    /// Returns the inventory key this line draws stock from.
    pub fn variant(&self) -> VariantKey {
        VariantKey::new(self.product_id, self.size.clone(), self.color.clone())
    }
}

/// Command to place an order for a buyer.
///
/// Payment is modeled as already authorized against `payment_method_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub user_id: UserId,
    pub address_id: AddressId,
    pub payment_method_id: PaymentMethodId,
    pub lines: Vec<OrderLine>,
}

impl PlaceOrder {
    /// Creates a new PlaceOrder command.
    pub fn new(
        user_id: UserId,
        address_id: AddressId,
        payment_method_id: PaymentMethodId,
        lines: Vec<OrderLine>,
    ) -> Self {
        Self {
            user_id,
            address_id,
            payment_method_id,
            lines,
        }
    }

    /// Checks the command before any storage is touched.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.user_id.is_valid() {
            return Err(DomainError::invalid("user_id must be a positive id"));
        }
        if !self.address_id.is_valid() {
            return Err(DomainError::invalid("address_id must be a positive id"));
        }
        if !self.payment_method_id.is_valid() {
            return Err(DomainError::invalid(
                "payment_method_id must be a positive id",
            ));
        }
        if self.lines.is_empty() {
            return Err(DomainError::invalid("order must contain at least one item"));
        }

        for (index, line) in self.lines.iter().enumerate() {
            if !line.product_id.is_valid() {
                return Err(DomainError::invalid(format!(
                    "items[{index}].product_id must be a positive id"
                )));
            }
            if line.quantity == 0 {
                return Err(DomainError::invalid(format!(
                    "items[{index}].quantity must be greater than 0"
                )));
            }
            if line.quantity > MAX_LINE_QUANTITY {
                return Err(DomainError::invalid(format!(
                    "items[{index}].quantity must not exceed {MAX_LINE_QUANTITY}"
                )));
            }
            if line.size.trim().is_empty() {
                return Err(DomainError::invalid(format!(
                    "items[{index}].size is required"
                )));
            }
            if line.color.trim().is_empty() {
                return Err(DomainError::invalid(format!(
                    "items[{index}].color is required"
                )));
            }
        }

        Ok(())
    }
}
