//! Domain error types.

use thiserror::Error;

/// Errors raised by domain validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The request is missing fields or carries malformed values.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A discount outside `0..=100` percent.
    #[error("Invalid discount: {percent}% (must be between 0 and 100)")]
    InvalidDiscount { percent: i64 },

    /// An order amount does not fit in the money representation.
    #[error("Order amount overflow: {0}")]
    AmountOverflow(String),
}

impl DomainError {
    /// Shorthand for [`DomainError::InvalidRequest`].
    pub fn invalid(message: impl Into<String>) -> Self {
        DomainError::InvalidRequest(message.into())
    }
}
