use async_trait::async_trait;
use common::{CategoryId, OrderId, ProductId, UserId};
use domain::{Category, NewOrder, Order, OrderItem, Product, ProductSummary, VariantKey};

use crate::query::{Page, PageRequest, ProductSearch};
use crate::Result;

/// An open storage transaction.
///
/// Every write made through a transaction becomes visible atomically on
/// [`commit`](StoreTransaction::commit) or not at all. Dropping the value
/// without committing rolls back, so an abandoned request can never leave a
/// transaction half-applied.
#[async_trait]
pub trait StoreTransaction: Send + Sized {
    /// Reads the current pricing view of a product.
    ///
    /// Returns None if the product does not exist.
    async fn find_product(&mut self, product_id: ProductId) -> Result<Option<Product>>;

    /// Checks that `quantity` units of `variant` are available and removes them.
    ///
    /// The decrement re-validates sufficiency at write time, so two
    /// transactions racing for the last units cannot both succeed. Fails
    /// with [`StoreError::InsufficientStock`](crate::StoreError::InsufficientStock)
    /// when the variant has no row or too few units.
    async fn reserve_stock(&mut self, variant: &VariantKey, quantity: u32) -> Result<()>;

    /// Inserts the order row and returns it with its assigned id.
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order>;

    /// Inserts one line item of an already inserted order.
    async fn insert_order_item(&mut self, item: &OrderItem) -> Result<()>;

    /// Makes every write of this transaction durable.
    async fn commit(self) -> Result<()>;

    /// Discards every write of this transaction.
    async fn rollback(self) -> Result<()>;
}

/// Core trait for storage backends.
///
/// All implementations must be thread-safe (Send + Sync); one value is
/// shared by every request.
#[async_trait]
pub trait Storage: Send + Sync {
    /// The transaction type handed out by [`begin`](Storage::begin).
    type Transaction: StoreTransaction;

    /// Opens a transaction.
    async fn begin(&self) -> Result<Self::Transaction>;

    /// Looks up the contact address of a buyer.
    async fn find_user_email(&self, user_id: UserId) -> Result<Option<String>>;

    /// Returns the committed stock of a variant, or None if it has no row.
    async fn stock_level(&self, variant: &VariantKey) -> Result<Option<u32>>;

    /// Loads a committed order.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Loads the line items of a committed order, in insertion order.
    async fn get_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>>;

    /// Lists all categories ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Lists one page of the products in a category.
    async fn products_by_category(
        &self,
        category_id: CategoryId,
        page: PageRequest,
    ) -> Result<Page<ProductSummary>>;

    /// Runs a keyword search over the catalog.
    async fn search_products(&self, search: ProductSearch) -> Result<Page<ProductSummary>>;
}
