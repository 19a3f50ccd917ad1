//! Database operations for the storefront `PostgreSQL` database.
//!
//! ## Tables (schema `store`)
//!
//! - `user` - Accounts (username, optional email, Argon2 hash)
//! - `product` / `bonus_product` - The two catalogs
//! - `cart_line` / `bonus_cart_line` - Per-user carts, one per catalog
//! - `customer_order` / `order_item` - Placed orders
//! - `contact` - Contact-form inbox
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p cwish-cli -- migrate
//! ```

pub mod carts;
pub mod contacts;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartRepository;
pub use contacts::ContactRepository;
pub use orders::{ConsumedCartLines, OrderRepository};
pub use products::{CatalogTable, NewProduct, ProductRepository};
pub use users::UserRepository;

/// Embedded migrations for the storefront schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation; carries the violated constraint's name.
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Rows changed between being read and being written.
    #[error("stale data: {0}")]
    Stale(String),
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
pub(crate) fn map_unique_violation(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unique").to_owned();
            return RepositoryError::Conflict(constraint);
        }
    }
    RepositoryError::Database(err)
}

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
