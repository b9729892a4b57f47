//! Workflow error types.

use common::ProductId;
use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The request is malformed. Nothing was written.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A requested product does not exist.
    #[error("Product with ID {0} not found")]
    ProductNotFound(ProductId),

    /// A variant has fewer units than requested, or no inventory row at all.
    #[error("Insufficient inventory for product {product_id} ({size}/{color}): requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        size: String,
        color: String,
        requested: u32,
    },

    /// Storage failed while reading or writing the order.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[source] StoreError),

    /// The confirmation could not be handed off. The order itself is unaffected.
    #[error("Notification failure: {0}")]
    NotificationFailure(String),
}

impl WorkflowError {
    /// Short label used for the `reason` metric dimension.
    pub fn reason(&self) -> &'static str {
        match self {
            WorkflowError::InvalidRequest(_) => "invalid_request",
            WorkflowError::ProductNotFound(_) => "product_not_found",
            WorkflowError::InsufficientStock { .. } => "insufficient_stock",
            WorkflowError::PersistenceFailure(_) => "persistence_failure",
            WorkflowError::NotificationFailure(_) => "notification_failure",
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InsufficientStock {
                variant, requested, ..
            } => WorkflowError::InsufficientStock {
                product_id: variant.product_id,
                size: variant.size,
                color: variant.color,
                requested,
            },
            other => WorkflowError::PersistenceFailure(other),
        }
    }
}

impl From<DomainError> for WorkflowError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidRequest(msg) => WorkflowError::InvalidRequest(msg),
            other => WorkflowError::InvalidRequest(other.to_string()),
        }
    }
}

/// Convenience type alias for workflow results.
pub type Result<T> = std::result::Result<T, WorkflowError>;
