use common::CategoryId;
use domain::Money;
use serde::Serialize;

/// Default page size for catalog listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// One-based page selection for listing queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Creates a page request; zero values fall back to page 1 / the default limit.
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: if page == 0 { 1 } else { page },
            limit: if limit == 0 { DEFAULT_PAGE_LIMIT } else { limit },
        }
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_LIMIT)
    }
}

/// A page of results plus the figures needed to render pagination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    /// Wraps one page of items.
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            limit: request.limit,
        }
    }

    /// Total number of pages (`ceil(total / limit)`).
    pub fn pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.limit.max(1)))
    }
}

/// Builder for keyword product searches.
///
/// The keyword is matched case-insensitively against name, description,
/// brand and model; the remaining fields narrow the result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductSearch {
    /// Substring to look for.
    pub keyword: String,

    /// Restrict to one category.
    pub category_id: Option<CategoryId>,

    /// Minimum base price (inclusive).
    pub min_price: Option<Money>,

    /// Maximum base price (inclusive).
    pub max_price: Option<Money>,

    /// Exact brand match.
    pub brand: Option<String>,

    /// Page to return.
    pub page: PageRequest,
}

impl ProductSearch {
    /// Creates a search for a keyword.
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            ..Default::default()
        }
    }

    /// Filters by category.
    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Filters to products priced at or above `price`.
    pub fn min_price(mut self, price: Money) -> Self {
        self.min_price = Some(price);
        self
    }

    /// Filters to products priced at or below `price`.
    pub fn max_price(mut self, price: Money) -> Self {
        self.max_price = Some(price);
        self
    }

    /// Filters by brand.
    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Selects the page to return.
    pub fn page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }
}
