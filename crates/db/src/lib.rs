//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - The `exchange_rate_cache` entity
//! - A repository implementing the durable rate tier
//! - Database migrations (Postgres and SQLite)

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{ExchangeRateCacheError, ExchangeRateCacheRepository};

use std::time::Duration;

use kitty_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection using the configured pool limits.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}
