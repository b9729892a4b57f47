use domain::VariantKey;
use thiserror::Error;

/// Errors that can occur when interacting with storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The variant has no row, or fewer units than requested.
    ///
    /// Raised both when the read check fails and when the conditional
    /// decrement matches no row because a concurrent order took the stock.
    #[error("Insufficient inventory for {variant}: requested {requested}, available {available}")]
    InsufficientStock {
        variant: VariantKey,
        requested: u32,
        available: u32,
    },

    /// A stored value could not be mapped onto the domain model.
    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow { table: &'static str, reason: String },

    /// A write was rejected by the backend (used by the in-memory store's failure injection).
    #[error("Write rejected: {0}")]
    WriteRejected(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
