//! Database operations for the storefront `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `customer` - Accounts with password hashes and roles
//! - `product` - The catalog
//! - `reservation` - Cart holds and completed purchases (the ledger)
//! - `sessions` - Tower-sessions storage (managed by the session store)
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded with
//! `sqlx::migrate!`; the binary applies them at startup.

pub mod catalog;
pub mod customers;
pub mod reservations;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors returned by the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness rule was violated (duplicate email, product already claimed).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The referenced row does not exist.
    #[error("not found")]
    NotFound,
}

/// Embedded schema migrations, applied by the binary at startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
