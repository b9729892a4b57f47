//! Demo catalog for running the server without a database.

use common::{CategoryId, ProductId, UserId};
use domain::{Category, DiscountPercent, Money, ProductSummary, VariantKey};
use store::InMemoryStore;

struct DemoProduct {
    id: i64,
    category: i64,
    name: &'static str,
    description: &'static str,
    brand: &'static str,
    model: &'static str,
    base_price: i64,
    discount: u8,
    variants: &'static [(&'static str, &'static str, u32)],
}

const CATEGORIES: &[(i64, &str, Option<i64>)] = &[
    (1, "Clothing", None),
    (2, "Shoes", None),
    (3, "T-Shirts", Some(1)),
    (4, "Running Shoes", Some(2)),
];

const PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        id: 1,
        category: 4,
        name: "Cloud Runner",
        description: "Lightweight running shoe with a breathable mesh upper",
        brand: "KAPPA",
        model: "CR-1",
        base_price: 10_000,
        discount: 10,
        variants: &[("40", "black", 5), ("42", "black", 8), ("42", "white", 3)],
    },
    DemoProduct {
        id: 2,
        category: 4,
        name: "Trail Blazer",
        description: "Grippy outsole for off-road running",
        brand: "NORTHPEAK",
        model: "TB-2",
        base_price: 18_900,
        discount: 0,
        variants: &[("41", "green", 4), ("43", "green", 2)],
    },
    DemoProduct {
        id: 3,
        category: 3,
        name: "Everyday Tee",
        description: "Soft cotton crew neck t-shirt",
        brand: "KAPPA",
        model: "ET-100",
        base_price: 2_500,
        discount: 20,
        variants: &[("S", "red", 10), ("M", "red", 5), ("L", "blue", 7)],
    },
];

/// Populates an empty store with a small catalog, stock and one buyer (id 1).
pub async fn seed(store: &InMemoryStore) {
    store.add_user(UserId::new(1), "demo@example.com").await;

    for &(id, name, parent) in CATEGORIES {
        store
            .add_category(Category {
                category_id: CategoryId::new(id),
                name: name.to_string(),
                parent_category_id: parent.map(CategoryId::new),
            })
            .await;
    }

    for product in PRODUCTS {
        store
            .add_product(ProductSummary {
                product_id: ProductId::new(product.id),
                name: product.name.to_string(),
                description: Some(product.description.to_string()),
                base_price: Money::from_minor(product.base_price),
                discount_percent: DiscountPercent::new(i64::from(product.discount))
                    .unwrap_or(DiscountPercent::NONE),
                brand: Some(product.brand.to_string()),
                model: Some(product.model.to_string()),
                category_id: Some(CategoryId::new(product.category)),
            })
            .await;

        for &(size, color, quantity) in product.variants {
            store
                .set_stock(
                    VariantKey::new(ProductId::new(product.id), size, color),
                    quantity,
                )
                .await;
        }
    }

    tracing::info!(
        categories = CATEGORIES.len(),
        products = PRODUCTS.len(),
        "seeded in-memory demo catalog"
    );
}
