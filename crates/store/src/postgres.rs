use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CategoryId, OrderId, ProductId, UserId};
use domain::{
    Category, DiscountPercent, Money, NewOrder, Order, OrderItem, OrderStatus, Product,
    ProductSummary, VariantKey,
};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::query::{Page, PageRequest, ProductSearch};
use crate::store::{Storage, StoreTransaction};
use crate::{Result, StoreError};

const PRODUCT_SUMMARY_COLUMNS: &str =
    "product_id, name, description, base_price, discount_percent, brand, model, category_id";

/// PostgreSQL-backed storage implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_summary(row: &PgRow) -> Result<ProductSummary> {
        Ok(ProductSummary {
            product_id: ProductId::new(row.try_get("product_id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            base_price: Money::from_minor(row.try_get("base_price")?),
            discount_percent: discount_from_row(row)?,
            brand: row.try_get("brand")?,
            model: row.try_get("model")?,
            category_id: row
                .try_get::<Option<i64>, _>("category_id")?
                .map(CategoryId::new),
        })
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        Ok(Order {
            id: OrderId::new(row.try_get("order_id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            address_id: row.try_get::<i64, _>("address_id")?.into(),
            payment_method_id: row.try_get::<i64, _>("payment_method_id")?.into(),
            created_at: row.try_get::<DateTime<Utc>, _>("order_date")?,
            status: OrderStatus::parse(&status).ok_or_else(|| StoreError::CorruptRow {
                table: "orders",
                reason: format!("unknown status '{status}'"),
            })?,
            subtotal: Money::from_minor(row.try_get("subtotal")?),
            shipping_fee: Money::from_minor(row.try_get("shipping_fee")?),
            discount_amount: Money::from_minor(row.try_get("discount_amount")?),
            total_amount: Money::from_minor(row.try_get("total_amount")?),
        })
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        let quantity: i32 = row.try_get("quantity")?;
        Ok(OrderItem {
            order_id: OrderId::new(row.try_get("order_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            size: row.try_get("size")?,
            color: row.try_get("color")?,
            quantity: u32::try_from(quantity).map_err(|_| StoreError::CorruptRow {
                table: "order_items",
                reason: format!("negative quantity {quantity}"),
            })?,
            price_at_time: Money::from_minor(row.try_get("price_at_time")?),
        })
    }
}

fn discount_from_row(row: &PgRow) -> Result<DiscountPercent> {
    let percent: i16 = row.try_get("discount_percent")?;
    DiscountPercent::new(i64::from(percent)).map_err(|e| StoreError::CorruptRow {
        table: "products",
        reason: e.to_string(),
    })
}

/// Escapes LIKE metacharacters so the keyword matches literally.
fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Transaction over a [`PostgresStore`].
///
/// Wraps a sqlx transaction, which issues `ROLLBACK` when dropped uncommitted.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn find_product(&mut self, product_id: ProductId) -> Result<Option<Product>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT product_id, name, base_price, discount_percent
            FROM products
            WHERE product_id = $1
            "#,
        )
        .bind(product_id.get())
        .fetch_optional(&mut *self.tx)
        .await?;

        match row {
            Some(row) => Ok(Some(Product {
                id: ProductId::new(row.try_get("product_id")?),
                name: row.try_get("name")?,
                base_price: Money::from_minor(row.try_get("base_price")?),
                discount_percent: discount_from_row(&row)?,
            })),
            None => Ok(None),
        }
    }

    async fn reserve_stock(&mut self, variant: &VariantKey, quantity: u32) -> Result<()> {
        let available: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT quantity FROM product_inventory
            WHERE product_id = $1 AND size = $2 AND color = $3
            "#,
        )
        .bind(variant.product_id.get())
        .bind(&variant.size)
        .bind(&variant.color)
        .fetch_optional(&mut *self.tx)
        .await?;

        let insufficient = |available: Option<i32>| StoreError::InsufficientStock {
            variant: variant.clone(),
            requested: quantity,
            available: available.and_then(|q| u32::try_from(q).ok()).unwrap_or(0),
        };

        let requested = i32::try_from(quantity).map_err(|_| insufficient(available))?;
        match available {
            Some(on_hand) if on_hand >= requested => {}
            _ => return Err(insufficient(available)),
        }

        // Guarded decrement: re-checks sufficiency against the row as it is
        // at write time, after any concurrent committed decrement.
        let result = sqlx::query(
            r#"
            UPDATE product_inventory
            SET quantity = quantity - $1
            WHERE product_id = $2 AND size = $3 AND color = $4 AND quantity >= $1
            "#,
        )
        .bind(requested)
        .bind(variant.product_id.get())
        .bind(&variant.size)
        .bind(&variant.color)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(%variant, quantity, "conditional decrement lost the race");
            metrics::counter!("inventory_reservation_conflicts_total").increment(1);
            return Err(insufficient(None));
        }

        Ok(())
    }

    async fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (user_id, address_id, payment_method_id, order_date, status,
                                subtotal, shipping_fee, discount_amount, total_amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING order_id
            "#,
        )
        .bind(order.user_id.get())
        .bind(order.address_id.get())
        .bind(order.payment_method_id.get())
        .bind(order.created_at)
        .bind(order.status.as_str())
        .bind(order.totals.subtotal.minor())
        .bind(order.totals.shipping_fee.minor())
        .bind(order.totals.discount_amount.minor())
        .bind(order.totals.total.minor())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(order.with_id(OrderId::new(order_id)))
    }

    async fn insert_order_item(&mut self, item: &OrderItem) -> Result<()> {
        let quantity = i32::try_from(item.quantity).map_err(|_| {
            StoreError::WriteRejected(format!("quantity {} out of range", item.quantity))
        })?;

        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, size, color, quantity, price_at_time)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(item.order_id.get())
        .bind(item.product_id.get())
        .bind(&item.size)
        .bind(&item.color)
        .bind(quantity)
        .bind(item.price_at_time.minor())
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl Storage for PostgresStore {
    type Transaction = PostgresTransaction;

    async fn begin(&self) -> Result<PostgresTransaction> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL READ COMMITTED")
            .execute(&mut *tx)
            .await?;
        Ok(PostgresTransaction { tx })
    }

    async fn find_user_email(&self, user_id: UserId) -> Result<Option<String>> {
        let email: Option<String> =
            sqlx::query_scalar("SELECT email FROM users WHERE user_id = $1")
                .bind(user_id.get())
                .fetch_optional(&self.pool)
                .await?;
        Ok(email)
    }

    async fn stock_level(&self, variant: &VariantKey) -> Result<Option<u32>> {
        let quantity: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT quantity FROM product_inventory
            WHERE product_id = $1 AND size = $2 AND color = $3
            "#,
        )
        .bind(variant.product_id.get())
        .bind(&variant.size)
        .bind(&variant.color)
        .fetch_optional(&self.pool)
        .await?;

        quantity
            .map(|q| {
                u32::try_from(q).map_err(|_| StoreError::CorruptRow {
                    table: "product_inventory",
                    reason: format!("negative quantity {q} for {variant}"),
                })
            })
            .transpose()
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT order_id, user_id, address_id, payment_method_id, order_date, status,
                   subtotal, shipping_fee, discount_amount, total_amount
            FROM orders
            WHERE order_id = $1
            "#,
        )
        .bind(order_id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_order).transpose()
    }

    async fn get_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, product_id, size, color, quantity, price_at_time
            FROM order_items
            WHERE order_id = $1
            ORDER BY order_item_id ASC
            "#,
        )
        .bind(order_id.get())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_item).collect()
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            "SELECT category_id, name, parent_category_id FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(Category {
                    category_id: CategoryId::new(row.try_get("category_id")?),
                    name: row.try_get("name")?,
                    parent_category_id: row
                        .try_get::<Option<i64>, _>("parent_category_id")?
                        .map(CategoryId::new),
                })
            })
            .collect()
    }

    async fn products_by_category(
        &self,
        category_id: CategoryId,
        page: PageRequest,
    ) -> Result<Page<ProductSummary>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_SUMMARY_COLUMNS} FROM products WHERE category_id = $1 \
             ORDER BY product_id LIMIT $2 OFFSET $3"
        ))
        .bind(category_id.get())
        .bind(i64::from(page.limit))
        .bind(sql_offset(page))
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(category_id.get())
            .fetch_one(&self.pool)
            .await?;

        let items = rows
            .iter()
            .map(Self::row_to_summary)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, total.max(0) as u64, page))
    }

    async fn search_products(&self, search: ProductSearch) -> Result<Page<ProductSummary>> {
        let mut filter = String::from(
            "(name ILIKE $1 OR description ILIKE $1 OR brand ILIKE $1 OR model ILIKE $1)",
        );
        let mut param_count = 1;

        // Build dynamic filter
        if search.category_id.is_some() {
            param_count += 1;
            filter.push_str(&format!(" AND category_id = ${param_count}"));
        }
        if search.min_price.is_some() {
            param_count += 1;
            filter.push_str(&format!(" AND base_price >= ${param_count}"));
        }
        if search.max_price.is_some() {
            param_count += 1;
            filter.push_str(&format!(" AND base_price <= ${param_count}"));
        }
        if search.brand.is_some() {
            param_count += 1;
            filter.push_str(&format!(" AND brand = ${param_count}"));
        }

        let select_sql = format!(
            "SELECT {PRODUCT_SUMMARY_COLUMNS} FROM products WHERE {filter} \
             ORDER BY product_id LIMIT ${} OFFSET ${}",
            param_count + 1,
            param_count + 2
        );
        let count_sql = format!("SELECT COUNT(*) FROM products WHERE {filter}");

        let pattern = like_pattern(&search.keyword);
        let mut select = sqlx::query(&select_sql).bind(pattern.clone());
        let mut count = sqlx::query_scalar::<_, i64>(&count_sql).bind(pattern);

        if let Some(category_id) = search.category_id {
            select = select.bind(category_id.get());
            count = count.bind(category_id.get());
        }
        if let Some(min) = search.min_price {
            select = select.bind(min.minor());
            count = count.bind(min.minor());
        }
        if let Some(max) = search.max_price {
            select = select.bind(max.minor());
            count = count.bind(max.minor());
        }
        if let Some(ref brand) = search.brand {
            select = select.bind(brand.clone());
            count = count.bind(brand.clone());
        }

        let rows = select
            .bind(i64::from(search.page.limit))
            .bind(sql_offset(search.page))
            .fetch_all(&self.pool)
            .await?;
        let total = count.fetch_one(&self.pool).await?;

        let items = rows
            .iter()
            .map(Self::row_to_summary)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, total.max(0) as u64, search.page))
    }
}

/// OFFSET bound for a page; pages past `i64::MAX` rows clamp to it.
fn sql_offset(page: PageRequest) -> i64 {
    i64::try_from(page.offset()).unwrap_or(i64::MAX)
}
