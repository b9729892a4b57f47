//! Catalog records read by the workflow and the browse endpoints.

use common::{CategoryId, ProductId};
use serde::{Deserialize, Serialize};

use crate::value_objects::{DiscountPercent, Money};

/// The pricing view of a product, as the order workflow reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub base_price: Money,
    pub discount_percent: DiscountPercent,
}

/// A product as shown in listings and search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub product_id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub base_price: Money,
    pub discount_percent: DiscountPercent,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub category_id: Option<CategoryId>,
}

impl ProductSummary {
    /// Returns the pricing view of this listing.
    pub fn to_product(&self) -> Product {
        Product {
            id: self.product_id,
            name: self.name.clone(),
            base_price: self.base_price,
            discount_percent: self.discount_percent,
        }
    }

    /// Case-insensitive substring match over name, description, brand and model.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        [
            Some(self.name.as_str()),
            self.description.as_deref(),
            self.brand.as_deref(),
            self.model.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// A node of the category tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: CategoryId,
    pub name: String,
    pub parent_category_id: Option<CategoryId>,
}
