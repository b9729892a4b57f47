use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use common::{CategoryId, OrderId, ProductId, UserId};
use domain::{Category, Money, NewOrder, Order, OrderItem, Product, ProductSummary, VariantKey};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::query::{Page, PageRequest, ProductSearch};
use crate::store::{Storage, StoreTransaction};
use crate::{Result, StoreError};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: HashMap<UserId, String>,
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, ProductSummary>,
    inventory: HashMap<VariantKey, u32>,
    orders: BTreeMap<OrderId, Order>,
    order_items: Vec<OrderItem>,
    last_order_id: i64,
    fail_on_insert_item: bool,
}

/// In-memory storage implementation for testing and local runs.
///
/// Transactions are serialized: [`begin`](Storage::begin) takes the store's
/// lock and stages stock changes and new rows privately, applying them to the
/// shared state only on commit. This is strictly stronger isolation than the
/// PostgreSQL backend provides, with the same all-or-nothing outcome.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a buyer with a contact address.
    pub async fn add_user(&self, user_id: UserId, email: impl Into<String>) {
        self.state.lock().await.users.insert(user_id, email.into());
    }

    /// Adds or replaces a category.
    pub async fn add_category(&self, category: Category) {
        self.state
            .lock()
            .await
            .categories
            .insert(category.category_id, category);
    }

    /// Adds or replaces a catalog product.
    pub async fn add_product(&self, product: ProductSummary) {
        self.state
            .lock()
            .await
            .products
            .insert(product.product_id, product);
    }

    /// Changes the base price of an existing product.
    ///
    /// Returns false if the product does not exist.
    pub async fn set_base_price(&self, product_id: ProductId, base_price: Money) -> bool {
        match self.state.lock().await.products.get_mut(&product_id) {
            Some(product) => {
                product.base_price = base_price;
                true
            }
            None => false,
        }
    }

    /// Sets the stock of a variant.
    pub async fn set_stock(&self, variant: VariantKey, quantity: u32) {
        self.state.lock().await.inventory.insert(variant, quantity);
    }

    /// Makes every subsequent order item insert fail, to exercise rollback paths.
    pub async fn set_fail_on_insert_item(&self, fail: bool) {
        self.state.lock().await.fail_on_insert_item = fail;
    }

    /// Returns the number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    /// Returns the number of committed order items across all orders.
    pub async fn order_item_count(&self) -> usize {
        self.state.lock().await.order_items.len()
    }

    /// Clears all data.
    pub async fn clear(&self) {
        *self.state.lock().await = MemoryState::default();
    }
}

/// Transaction over an [`InMemoryStore`].
///
/// Holds the store lock for its whole lifetime. Writes go to staging areas
/// sized by the transaction, not by the store; dropping it discards them.
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    /// On-hand quantity after this transaction's reservations.
    stock: HashMap<VariantKey, u32>,
    orders: Vec<Order>,
    items: Vec<OrderItem>,
}

impl InMemoryTransaction {
    fn on_hand(&self, variant: &VariantKey) -> Option<u32> {
        self.stock
            .get(variant)
            .or_else(|| self.guard.inventory.get(variant))
            .copied()
    }
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn find_product(&mut self, product_id: ProductId) -> Result<Option<Product>> {
        Ok(self
            .guard
            .products
            .get(&product_id)
            .map(ProductSummary::to_product))
    }

    async fn reserve_stock(&mut self, variant: &VariantKey, quantity: u32) -> Result<()> {
        let available = self.on_hand(variant);

        match available {
            Some(on_hand) if on_hand >= quantity => {
                self.stock.insert(variant.clone(), on_hand - quantity);
                Ok(())
            }
            _ => Err(StoreError::InsufficientStock {
                variant: variant.clone(),
                requested: quantity,
                available: available.unwrap_or(0),
            }),
        }
    }

    async fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        let next_id = self.guard.last_order_id + self.orders.len() as i64 + 1;
        let order = order.with_id(OrderId::new(next_id));
        self.orders.push(order.clone());
        Ok(order)
    }

    async fn insert_order_item(&mut self, item: &OrderItem) -> Result<()> {
        if self.guard.fail_on_insert_item {
            return Err(StoreError::WriteRejected(format!(
                "order_items insert for order {}",
                item.order_id
            )));
        }
        self.items.push(item.clone());
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        let InMemoryTransaction {
            mut guard,
            stock,
            orders,
            items,
        } = self;
        guard.inventory.extend(stock);
        for order in orders {
            guard.last_order_id = order.id.get();
            guard.orders.insert(order.id, order);
        }
        guard.order_items.extend(items);
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Storage for InMemoryStore {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> Result<InMemoryTransaction> {
        let guard = self.state.clone().lock_owned().await;
        Ok(InMemoryTransaction {
            guard,
            stock: HashMap::new(),
            orders: Vec::new(),
            items: Vec::new(),
        })
    }

    async fn find_user_email(&self, user_id: UserId) -> Result<Option<String>> {
        Ok(self.state.lock().await.users.get(&user_id).cloned())
    }

    async fn stock_level(&self, variant: &VariantKey) -> Result<Option<u32>> {
        Ok(self.state.lock().await.inventory.get(variant).copied())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.lock().await.orders.get(&order_id).cloned())
    }

    async fn get_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let state = self.state.lock().await;
        Ok(state
            .order_items
            .iter()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let state = self.state.lock().await;
        let mut categories: Vec<_> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn products_by_category(
        &self,
        category_id: CategoryId,
        page: PageRequest,
    ) -> Result<Page<ProductSummary>> {
        let state = self.state.lock().await;
        let matching: Vec<_> = state
            .products
            .values()
            .filter(|p| p.category_id == Some(category_id))
            .cloned()
            .collect();
        Ok(paginate(matching, page))
    }

    async fn search_products(&self, search: ProductSearch) -> Result<Page<ProductSummary>> {
        let state = self.state.lock().await;
        let matching: Vec<_> = state
            .products
            .values()
            .filter(|p| {
                if !p.matches_keyword(&search.keyword) {
                    return false;
                }
                if let Some(category_id) = search.category_id
                    && p.category_id != Some(category_id)
                {
                    return false;
                }
                if let Some(min) = search.min_price
                    && p.base_price < min
                {
                    return false;
                }
                if let Some(max) = search.max_price
                    && p.base_price > max
                {
                    return false;
                }
                if let Some(ref brand) = search.brand
                    && p.brand.as_deref() != Some(brand.as_str())
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();
        Ok(paginate(matching, search.page))
    }
}

fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let page_items = items
        .into_iter()
        .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
        .take(request.limit as usize)
        .collect();
    Page::new(page_items, total, request)
}
