//! HTTP API server for the order service.
//!
//! Provides the order placement endpoint and catalog browsing endpoints,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod demo;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::PricingEngine;
use metrics_exporter_prometheus::PrometheusHandle;
use store::Storage;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use workflow::{NotificationQueue, OrderWorkflow};

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Storage + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/api/orders", post(routes::orders::create::<S>))
        .route("/api/categories", get(routes::catalog::list_categories::<S>))
        .route(
            "/api/categories/{category_id}/products",
            get(routes::catalog::products_by_category::<S>),
        )
        .route("/api/products/search", get(routes::catalog::search::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires a storage backend, pricing and the confirmation queue into application state.
pub fn create_default_state<S: Storage + 'static>(
    store: S,
    pricing: PricingEngine,
    notifications: NotificationQueue,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        workflow: OrderWorkflow::new(store, pricing, notifications),
    })
}
