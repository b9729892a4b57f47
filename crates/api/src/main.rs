//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use api::routes::AppState;
use common::wait_for;
use domain::PricingEngine;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use store::{InMemoryStore, PostgresStore, Storage};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use workflow::{LogDeliverer, NotificationQueue};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Serves the API until a shutdown signal arrives.
async fn serve<S: Storage + 'static>(
    config: &Config,
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Result<(), BoxError> {
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 3. Start the confirmation queue
    let (notifications, delivery) =
        NotificationQueue::spawn(LogDeliverer, config.notification_delay);
    let pricing = PricingEngine::new(config.shipping_fee);

    // 4. Pick the storage backend and serve
    match config.database_url.as_deref() {
        Some(url) => {
            let pool = wait_for("postgres", config.wait_policy(), || {
                PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .connect(url)
            })
            .await?;

            let store = PostgresStore::new(pool);
            store.run_migrations().await?;
            tracing::info!("database migrations applied");

            let state = api::create_default_state(store, pricing, notifications);
            serve(&config, state, metrics_handle).await?;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store with demo data");
            let store = InMemoryStore::new();
            api::demo::seed(&store).await;

            let state = api::create_default_state(store, pricing, notifications);
            serve(&config, state, metrics_handle).await?;
        }
    }

    // 5. Every queue handle is gone with the router; wait for the backlog to drain
    delivery.await?;
    tracing::info!("server shut down gracefully");
    Ok(())
}
