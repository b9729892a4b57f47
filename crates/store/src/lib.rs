pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, InMemoryTransaction};
pub use postgres::{PostgresStore, PostgresTransaction};
pub use query::{DEFAULT_PAGE_LIMIT, Page, PageRequest, ProductSearch};
pub use store::{Storage, StoreTransaction};
