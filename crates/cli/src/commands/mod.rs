//! CLI subcommands.

pub mod contacts;
pub mod migrate;
pub mod seed;

use sqlx::PgPool;
use thiserror::Error;

use cwish_storefront::config::{ConfigError, get_database_url};
use cwish_storefront::db::{self, RepositoryError};

/// Errors shared by the subcommands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("{0}")]
    Invalid(String),
}

/// Connect to the storefront database (`STOREFRONT_DATABASE_URL`, falling
/// back to `DATABASE_URL`).
///
/// # Errors
///
/// Returns an error if the URL is missing or the connection fails.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
    tracing::info!("Connecting to storefront database...");
    Ok(db::create_pool(&database_url).await?)
}
