//! Cached catalog lookups.
//!
//! Every cart and checkout operation starts by resolving the active product,
//! so lookups are cached in-process with `moka` (60-second TTL). Misses are
//! not cached.

use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use cwish_core::ProductKind;

use crate::db::{CatalogTable, ProductRepository, RepositoryError};
use crate::models::{BonusProduct, Product};

/// Cache key for catalog lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Active(ProductKind),
    Product(ProductKind, i32),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    BonusProduct(Box<BonusProduct>),
}

/// A catalog whose rows can be held in the [`CatalogCache`].
pub trait CachedCatalog: CatalogTable {
    fn into_cache_value(self) -> CacheValue;
    fn from_cache_value(value: CacheValue) -> Option<Self>;
}

impl CachedCatalog for Product {
    fn into_cache_value(self) -> CacheValue {
        CacheValue::Product(Box::new(self))
    }

    fn from_cache_value(value: CacheValue) -> Option<Self> {
        match value {
            CacheValue::Product(product) => Some(*product),
            CacheValue::BonusProduct(_) => None,
        }
    }
}

impl CachedCatalog for BonusProduct {
    fn into_cache_value(self) -> CacheValue {
        CacheValue::BonusProduct(Box::new(self))
    }

    fn from_cache_value(value: CacheValue) -> Option<Self> {
        match value {
            CacheValue::BonusProduct(product) => Some(*product),
            CacheValue::Product(_) => None,
        }
    }
}

/// In-process cache in front of [`ProductRepository`].
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<CacheKey, CacheValue>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl CatalogCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(100)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    /// The active product of a catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup misses the cache and the query fails.
    pub async fn active<P: CachedCatalog>(&self, pool: &PgPool) -> Result<Option<P>, RepositoryError> {
        let key = CacheKey::Active(P::KIND);
        if let Some(product) = self.cache.get(&key).await.and_then(P::from_cache_value) {
            debug!(kind = %P::KIND, "Cache hit for active product");
            return Ok(Some(product));
        }

        let product = ProductRepository::new(pool).active::<P>().await?;
        if let Some(product) = &product {
            self.cache
                .insert(key, product.clone().into_cache_value())
                .await;
        }
        Ok(product)
    }

    /// A specific product, only if it is active.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup misses the cache and the query fails.
    pub async fn get_active<P: CachedCatalog>(
        &self,
        pool: &PgPool,
        id: i32,
    ) -> Result<Option<P>, RepositoryError> {
        let key = CacheKey::Product(P::KIND, id);
        if let Some(product) = self.cache.get(&key).await.and_then(P::from_cache_value) {
            debug!(kind = %P::KIND, id, "Cache hit for product");
            return Ok(Some(product));
        }

        let product = ProductRepository::new(pool).get_active::<P>(id).await?;
        if let Some(product) = &product {
            self.cache
                .insert(key, product.clone().into_cache_value())
                .await;
        }
        Ok(product)
    }
}
