//! Catalog repository.
//!
//! Both catalogs share one repository; the table layout of each is described
//! by its [`CatalogTable`] implementation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};

use cwish_core::{BonusProductId, CurrencyCode, ProductId};

use super::RepositoryError;
use crate::models::{BonusProduct, CatalogProduct, Product};

/// Storage layout for one catalog and its cart table.
pub trait CatalogTable: CatalogProduct {
    /// Product table.
    const TABLE: &'static str;
    /// Cart table whose `product_id` references [`Self::TABLE`].
    const CART_TABLE: &'static str;
    /// Product columns, qualified with the alias `p`.
    const COLUMNS: &'static str;

    type Row: for<'r> FromRow<'r, PgRow> + Send + Unpin;

    /// Convert a row into the domain type.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a column holds a value the
    /// domain type rejects.
    fn from_row(row: Self::Row) -> Result<Self, RepositoryError>;
}

#[derive(FromRow)]
pub struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    price: Decimal,
    currency: String,
    image_url: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
pub struct BonusProductRow {
    id: BonusProductId,
    name: String,
    description: String,
    price: Decimal,
    currency: String,
    image_url: Option<String>,
    is_active: bool,
    is_digital: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_currency(raw: &str) -> Result<CurrencyCode, RepositoryError> {
    raw.parse()
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid currency in database: {e}")))
}

impl CatalogTable for Product {
    const TABLE: &'static str = "store.product";
    const CART_TABLE: &'static str = "store.cart_line";
    const COLUMNS: &'static str = "p.id, p.name, p.description, p.price, p.currency, \
         p.image_url, p.is_active, p.created_at, p.updated_at";

    type Row = ProductRow;

    fn from_row(row: ProductRow) -> Result<Self, RepositoryError> {
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            currency: parse_currency(&row.currency)?,
            image_url: row.image_url,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl CatalogTable for BonusProduct {
    const TABLE: &'static str = "store.bonus_product";
    const CART_TABLE: &'static str = "store.bonus_cart_line";
    const COLUMNS: &'static str = "p.id, p.name, p.description, p.price, p.currency, \
         p.image_url, p.is_active, p.is_digital, p.created_at, p.updated_at";

    type Row = BonusProductRow;

    fn from_row(row: BonusProductRow) -> Result<Self, RepositoryError> {
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            currency: parse_currency(&row.currency)?,
            image_url: row.image_url,
            is_active: row.is_active,
            is_digital: row.is_digital,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Fields for inserting a catalog row.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub currency: CurrencyCode,
    pub image_url: Option<String>,
}

/// Repository for both catalogs.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The active product of a catalog: the active row with the lowest id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active<P: CatalogTable>(&self) -> Result<Option<P>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM {} p WHERE p.is_active ORDER BY p.id LIMIT 1",
            P::COLUMNS,
            P::TABLE
        );
        let row = sqlx::query_as::<_, P::Row>(&sql)
            .fetch_optional(self.pool)
            .await?;
        row.map(P::from_row).transpose()
    }

    /// A specific product, only if it is active.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active<P: CatalogTable>(&self, id: i32) -> Result<Option<P>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM {} p WHERE p.id = $1 AND p.is_active",
            P::COLUMNS,
            P::TABLE
        );
        let row = sqlx::query_as::<_, P::Row>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        row.map(P::from_row).transpose()
    }

    /// Number of rows in a catalog, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count<P: CatalogTable>(&self) -> Result<i64, RepositoryError> {
        let sql = format!("SELECT COUNT(*) FROM {}", P::TABLE);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(self.pool).await?;
        Ok(count)
    }

    /// Insert an active product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create<P: CatalogTable>(&self, product: &NewProduct) -> Result<P, RepositoryError> {
        let sql = format!(
            "INSERT INTO {} AS p (name, description, price, currency, image_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            P::TABLE,
            P::COLUMNS
        );
        let row = sqlx::query_as::<_, P::Row>(&sql)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.currency.code())
            .bind(product.image_url.as_deref())
            .fetch_one(self.pool)
            .await?;
        P::from_row(row)
    }
}
