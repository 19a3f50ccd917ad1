//! Cart repository, shared by the main cart and the bonus cart.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};

use cwish_core::{CartLineId, PrintPosition, UserId};

use super::RepositoryError;
use super::products::CatalogTable;
use crate::models::{Cart, CartLine, MAX_LINE_QUANTITY};

/// A cart line joined with its product row.
struct CartLineRow<R> {
    line_id: CartLineId,
    quantity: i32,
    customization: Option<String>,
    print_position: Option<PrintPosition>,
    line_created_at: DateTime<Utc>,
    line_updated_at: DateTime<Utc>,
    product: R,
}

impl<'r, R> FromRow<'r, PgRow> for CartLineRow<R>
where
    R: FromRow<'r, PgRow>,
{
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            line_id: row.try_get("line_id")?,
            quantity: row.try_get("quantity")?,
            customization: row.try_get("customization")?,
            print_position: row.try_get("print_position")?,
            line_created_at: row.try_get("line_created_at")?,
            line_updated_at: row.try_get("line_updated_at")?,
            product: R::from_row(row)?,
        })
    }
}

/// Repository for per-user cart lines.
///
/// Every method is generic over the catalog, which selects the table pair.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All of a user's lines in one cart, oldest first, with totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list<P: CatalogTable>(&self, user_id: UserId) -> Result<Cart<P>, RepositoryError> {
        let sql = format!(
            "SELECT c.id AS line_id, c.quantity, c.customization, c.print_position, \
                    c.created_at AS line_created_at, c.updated_at AS line_updated_at, {} \
             FROM {} c JOIN {} p ON p.id = c.product_id \
             WHERE c.user_id = $1 \
             ORDER BY c.id",
            P::COLUMNS,
            P::CART_TABLE,
            P::TABLE
        );
        let rows = sqlx::query_as::<_, CartLineRow<P::Row>>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        let lines = rows
            .into_iter()
            .map(|row| {
                Ok(CartLine::new(
                    row.line_id,
                    P::from_row(row.product)?,
                    row.quantity,
                    row.customization,
                    row.print_position,
                    row.line_created_at,
                    row.line_updated_at,
                ))
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(Cart::from_lines(lines))
    }

    /// Add `quantity` units of a product, creating the line if needed.
    ///
    /// An existing line keeps its customization and print position unless
    /// new ones are supplied. The combined quantity is capped at
    /// [`MAX_LINE_QUANTITY`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn add<P: CatalogTable>(
        &self,
        user_id: UserId,
        product_id: i32,
        quantity: i32,
        customization: Option<&str>,
        print_position: Option<PrintPosition>,
    ) -> Result<CartLineId, RepositoryError> {
        let sql = format!(
            "INSERT INTO {} AS c (user_id, product_id, quantity, customization, print_position) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id, product_id) DO UPDATE SET \
                 quantity = LEAST(c.quantity + EXCLUDED.quantity, $6), \
                 customization = COALESCE(EXCLUDED.customization, c.customization), \
                 print_position = COALESCE(EXCLUDED.print_position, c.print_position), \
                 updated_at = NOW() \
             RETURNING c.id",
            P::CART_TABLE
        );
        let id: CartLineId = sqlx::query_scalar(&sql)
            .bind(user_id)
            .bind(product_id)
            .bind(quantity)
            .bind(customization)
            .bind(print_position)
            .bind(MAX_LINE_QUANTITY)
            .fetch_one(self.pool)
            .await?;
        Ok(id)
    }

    /// Set the quantity of the user's line for a product; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such line.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_quantity<P: CatalogTable>(
        &self,
        user_id: UserId,
        product_id: i32,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let sql = if quantity == 0 {
            format!(
                "DELETE FROM {} WHERE user_id = $1 AND product_id = $2",
                P::CART_TABLE
            )
        } else {
            format!(
                "UPDATE {} SET quantity = $3, updated_at = NOW() \
                 WHERE user_id = $1 AND product_id = $2",
                P::CART_TABLE
            )
        };

        let mut query = sqlx::query(&sql).bind(user_id).bind(product_id);
        if quantity != 0 {
            query = query.bind(quantity);
        }
        let result = query.execute(self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove every line from one of the user's carts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear<P: CatalogTable>(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let sql = format!("DELETE FROM {} WHERE user_id = $1", P::CART_TABLE);
        let result = sqlx::query(&sql).bind(user_id).execute(self.pool).await?;
        Ok(result.rows_affected())
    }
}
