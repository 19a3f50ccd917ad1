//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::catalog::CatalogCache;
use crate::services::email::EmailService;
use crate::services::shirtigo::{ShirtigoClient, ShirtigoError};

/// Error creating the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("shirtigo client: {0}")]
    Shirtigo(#[from] ShirtigoError),
    #[error("smtp transport: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: CatalogCache,
    shirtigo: Option<ShirtigoClient>,
    email: Option<EmailService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The fulfillment client and the mailer are only built when their
    /// configuration is present.
    ///
    /// # Errors
    ///
    /// Returns an error if either outbound client cannot be constructed.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let shirtigo = config
            .shirtigo
            .as_ref()
            .map(ShirtigoClient::new)
            .transpose()?;
        let email = config.email.as_ref().map(EmailService::new).transpose()?;

        if shirtigo.is_none() {
            tracing::warn!("SHIRTIGO_API_TOKEN not set, orders will not be forwarded for printing");
        }
        if email.is_none() {
            tracing::warn!("SMTP_HOST not set, order confirmations will not be sent");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog: CatalogCache::default(),
                shirtigo,
                email,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the catalog cache.
    #[must_use]
    pub fn catalog(&self) -> &CatalogCache {
        &self.inner.catalog
    }

    /// The Shirtigo client, if fulfillment is configured.
    #[must_use]
    pub fn shirtigo(&self) -> Option<&ShirtigoClient> {
        self.inner.shirtigo.as_ref()
    }

    /// The mailer, if SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }
}
