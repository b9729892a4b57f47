//! Application configuration loaded from environment variables.

use std::time::Duration;

use common::WaitPolicy;
use domain::{Money, SHIPPING_FEE};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL URL; when unset the server runs on an
///   in-memory store seeded with a demo catalog
/// - `DB_MAX_CONNECTIONS`: pool size (default: `10`)
/// - `DB_CONNECT_ATTEMPTS`: startup probe attempts (default: `30`)
/// - `DB_CONNECT_DELAY_MS`: pause between probe attempts (default: `2000`)
/// - `SHIPPING_FEE`: flat fee in minor units (default: `30000`)
/// - `NOTIFICATION_DELAY_MS`: pause between confirmation deliveries (default: `2000`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_connect_attempts: u32,
    pub db_connect_delay: Duration,
    pub shipping_fee: Money,
    pub notification_delay: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            db_max_connections: parsed("DB_MAX_CONNECTIONS")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.db_max_connections),
            db_connect_attempts: parsed("DB_CONNECT_ATTEMPTS")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.db_connect_attempts),
            db_connect_delay: parsed("DB_CONNECT_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.db_connect_delay),
            shipping_fee: parsed("SHIPPING_FEE")
                .and_then(|fee| i64::try_from(fee).ok())
                .map(Money::from_minor)
                .unwrap_or(defaults.shipping_fee),
            notification_delay: parsed("NOTIFICATION_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.notification_delay),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the startup probe policy for the database.
    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::new(self.db_connect_attempts, self.db_connect_delay)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            db_max_connections: 10,
            db_connect_attempts: 30,
            db_connect_delay: Duration::from_millis(2000),
            shipping_fee: SHIPPING_FEE,
            notification_delay: Duration::from_millis(2000),
        }
    }
}
