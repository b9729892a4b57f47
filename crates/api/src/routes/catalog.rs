//! Catalog browsing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use common::CategoryId;
use domain::{Category, Money, ProductSummary};
use serde::{Deserialize, Serialize};
use store::{Page, PageRequest, ProductSearch, Storage};

use super::{ApiResponse, AppState};
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// Non-positive or out-of-range values fall back to the defaults.
    pub fn to_request(&self) -> PageRequest {
        let positive = |v: Option<i64>| v.and_then(|v| u32::try_from(v).ok()).unwrap_or(0);
        PageRequest::new(positive(self.page), positive(self.limit))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub query: Option<String>,
    pub category: Option<i64>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub brand: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl SearchParams {
    fn into_search(self) -> Result<ProductSearch, ApiError> {
        let keyword = self
            .query
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("Search query is required".to_string()))?;

        let page = PageParams {
            page: self.page,
            limit: self.limit,
        }
        .to_request();

        let mut search = ProductSearch::new(keyword).page(page);
        if let Some(category) = self.category {
            search = search.category(CategoryId::new(category));
        }
        if let Some(min) = self.min_price {
            search = search.min_price(Money::from_minor(min));
        }
        if let Some(max) = self.max_price {
            search = search.max_price(Money::from_minor(max));
        }
        if let Some(brand) = self.brand.filter(|b| !b.is_empty()) {
            search = search.brand(brand);
        }
        Ok(search)
    }
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u64,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductSummary>,
    pub pagination: Pagination,
}

impl From<Page<ProductSummary>> for ProductListResponse {
    fn from(page: Page<ProductSummary>) -> Self {
        let pagination = Pagination {
            total: page.total,
            page: page.page,
            limit: page.limit,
            pages: page.pages(),
        };
        Self {
            products: page.items,
            pagination,
        }
    }
}

// -- Handlers --

/// GET /api/categories: all categories ordered by name.
#[tracing::instrument(skip(state))]
pub async fn list_categories<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<ApiResponse<Vec<Category>>>, ApiError> {
    let categories = state
        .store()
        .list_categories()
        .await
        .map_err(ApiError::store("Failed to fetch categories"))?;

    Ok(Json(ApiResponse::ok(categories)))
}

/// GET /api/categories/{category_id}/products: one page of a category.
#[tracing::instrument(skip(state, category_id, params))]
pub async fn products_by_category<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    category_id: Result<Path<i64>, PathRejection>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<ApiResponse<ProductListResponse>>, ApiError> {
    let Path(category_id) =
        category_id.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let Query(params) = params.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let page = state
        .store()
        .products_by_category(CategoryId::new(category_id), params.to_request())
        .await
        .map_err(ApiError::store("Failed to fetch products"))?;

    Ok(Json(ApiResponse::ok(page.into())))
}

/// GET /api/products/search: keyword search with optional filters.
#[tracing::instrument(skip(state, params))]
pub async fn search<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<ApiResponse<ProductListResponse>>, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let search = params.into_search()?;

    let page = state
        .store()
        .search_products(search)
        .await
        .map_err(ApiError::store("Failed to search products"))?;

    Ok(Json(ApiResponse::ok(page.into())))
}
