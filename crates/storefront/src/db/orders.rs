//! Order repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use cwish_core::{
    BonusProductId, CartLineId, Email, OrderId, OrderItemId, OrderStatus, PrintPosition,
    ProductId, UserId,
};

use super::{CatalogTable, RepositoryError};
use crate::models::{
    BonusProduct, Cart, CatalogProduct, NewOrder, Order, OrderItem, OrderLineProduct, Product,
    ShippingDetails,
};

const ORDER_COLUMNS: &str = "id, user_id, email, first_name, last_name, address, city, country, \
     postal_code, phone, status, total_amount, currency, shirtigo_order_id, shirtigo_response, \
     print_positions, personalizations, created_at, updated_at";

#[derive(FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: UserId,
    email: String,
    first_name: String,
    last_name: String,
    address: String,
    city: String,
    country: String,
    postal_code: String,
    phone: Option<String>,
    status: OrderStatus,
    total_amount: Decimal,
    currency: String,
    shirtigo_order_id: Option<String>,
    shirtigo_response: Option<serde_json::Value>,
    print_positions: Option<String>,
    personalizations: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: Uuid,
    product_id: Option<ProductId>,
    bonus_product_id: Option<BonusProductId>,
    product_name: Option<String>,
    product_image: Option<String>,
    quantity: i32,
    unit_price: Decimal,
    total_price: Decimal,
    print_position: Option<PrintPosition>,
    personalization: Option<String>,
}

impl OrderItemRow {
    fn into_item(self) -> Result<OrderItem, RepositoryError> {
        let product = OrderLineProduct::from_columns(self.product_id, self.bonus_product_id)
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "order item {} must reference exactly one product",
                    self.id
                ))
            })?;

        Ok(OrderItem {
            id: self.id,
            product,
            product_name: self.product_name.unwrap_or_default(),
            product_image: self.product_image,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_price: self.total_price,
            print_position: self.print_position,
            personalization: self.personalization,
        })
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let currency = self.currency.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid currency in database: {e}"))
        })?;

        Ok(Order {
            id: OrderId::from_uuid(self.id),
            user_id: self.user_id,
            shipping: ShippingDetails {
                email,
                first_name: self.first_name,
                last_name: self.last_name,
                address: self.address,
                city: self.city,
                country: self.country,
                postal_code: self.postal_code,
                phone: self.phone,
            },
            status: self.status,
            total_amount: self.total_amount,
            currency,
            shirtigo_order_id: self.shirtigo_order_id,
            shirtigo_response: self.shirtigo_response,
            print_positions: self.print_positions,
            personalizations: self.personalizations,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        })
    }
}

/// A cart line as it was when the order was priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumedLine {
    pub id: CartLineId,
    pub quantity: i32,
}

/// Cart lines converted into an order, deleted in the same transaction.
///
/// A line is only deleted while it still has the quantity that was ordered.
#[derive(Debug, Clone, Default)]
pub struct ConsumedCartLines {
    pub main: Vec<ConsumedLine>,
    pub bonus: Vec<ConsumedLine>,
}

impl ConsumedCartLines {
    #[must_use]
    pub fn from_carts(main: &Cart<Product>, bonus: &Cart<BonusProduct>) -> Self {
        Self {
            main: consumed_lines(main),
            bonus: consumed_lines(bonus),
        }
    }
}

fn consumed_lines<P: CatalogProduct>(cart: &Cart<P>) -> Vec<ConsumedLine> {
    cart.items
        .iter()
        .map(|line| ConsumedLine {
            id: line.id,
            quantity: line.quantity,
        })
        .collect()
}

/// `Stale` unless every consumed line was deleted.
fn check_consumed(table: &str, expected: usize, deleted: u64) -> Result<(), RepositoryError> {
    if u64::try_from(expected).is_ok_and(|expected| expected == deleted) {
        Ok(())
    } else {
        Err(RepositoryError::Stale(format!(
            "{table}: {deleted} of {expected} lines unchanged"
        )))
    }
}

/// Delete consumed lines of one cart table, failing if any of them changed.
async fn delete_consumed(
    conn: &mut PgConnection,
    table: &str,
    user_id: UserId,
    lines: &[ConsumedLine],
) -> Result<(), RepositoryError> {
    if lines.is_empty() {
        return Ok(());
    }
    let (ids, quantities): (Vec<i32>, Vec<i32>) = lines
        .iter()
        .map(|line| (line.id.as_i32(), line.quantity))
        .unzip();

    let sql = format!(
        "DELETE FROM {table} c \
         USING UNNEST($2::int4[], $3::int4[]) AS consumed(id, quantity) \
         WHERE c.user_id = $1 AND c.id = consumed.id AND c.quantity = consumed.quantity"
    );
    let deleted = sqlx::query(&sql)
        .bind(user_id)
        .bind(&ids)
        .bind(&quantities)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    check_consumed(table, lines.len(), deleted)
}

/// Repository for orders and their items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store an order with its items and delete the cart lines it consumed,
    /// all in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Stale` if a consumed cart line was changed or
    /// removed after it was read, and `RepositoryError::Database` if any
    /// statement fails. Nothing is written in either case.
    pub async fn create(
        &self,
        order: &NewOrder,
        consumed: &ConsumedCartLines,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO store.customer_order (
                id, user_id, email, first_name, last_name, address, city, country,
                postal_code, phone, total_amount, currency, print_positions, personalizations
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ",
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id)
        .bind(&order.shipping.email)
        .bind(&order.shipping.first_name)
        .bind(&order.shipping.last_name)
        .bind(&order.shipping.address)
        .bind(&order.shipping.city)
        .bind(&order.shipping.country)
        .bind(&order.shipping.postal_code)
        .bind(order.shipping.phone.as_deref())
        .bind(order.total_amount)
        .bind(order.currency.code())
        .bind(order.print_positions.as_deref())
        .bind(order.personalizations.as_deref())
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            let (product_id, bonus_product_id) = item.product.columns();
            sqlx::query(
                r"
                INSERT INTO store.order_item (
                    order_id, product_id, bonus_product_id, quantity, unit_price,
                    total_price, print_position, personalization
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(order.id.as_uuid())
            .bind(product_id)
            .bind(bonus_product_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total_price())
            .bind(item.print_position)
            .bind(item.personalization.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        delete_consumed(&mut *tx, Product::CART_TABLE, order.user_id, &consumed.main).await?;
        delete_consumed(&mut *tx, BonusProduct::CART_TABLE, order.user_id, &consumed.bonus)
            .await?;

        tx.commit().await?;

        self.get_for_user(order.user_id, order.id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Store the vendor's answer on the order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn record_fulfillment(
        &self,
        id: OrderId,
        vendor_order_id: Option<&str>,
        response: &serde_json::Value,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE store.customer_order
            SET shirtigo_order_id = $2, shirtigo_response = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .bind(vendor_order_id)
        .bind(response)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// A user's orders, newest first, with their items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM store.customer_order \
             WHERE user_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        self.attach_items(rows).await
    }

    /// One of a user's orders. Orders owned by someone else are `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM store.customer_order WHERE id = $1 AND user_id = $2"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id.as_uuid())
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.attach_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Change the status of one of a user's orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update_status(
        &self,
        user_id: UserId,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE store.customer_order
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id.as_uuid())
        .bind(user_id)
        .bind(status)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_for_user(user_id, id).await
    }

    async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT i.id, i.order_id, i.product_id, i.bonus_product_id,
                   COALESCE(p.name, b.name) AS product_name,
                   COALESCE(p.image_url, b.image_url) AS product_image,
                   i.quantity, i.unit_price, i.total_price, i.print_position, i.personalization
            FROM store.order_item i
            LEFT JOIN store.product p ON p.id = i.product_id
            LEFT JOIN store.bonus_product b ON b.id = i.bonus_product_id
            WHERE i.order_id = ANY($1)
            ORDER BY i.id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            let order_id = row.order_id;
            items_by_order
                .entry(order_id)
                .or_default()
                .push(row.into_item()?);
        }

        rows.into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_all_consumed_lines_deleted() {
        assert!(check_consumed("store.cart_line", 2, 2).is_ok());
        assert!(check_consumed("store.cart_line", 0, 0).is_ok());
    }

    #[test]
    fn test_changed_line_is_stale() {
        // A concurrent add bumped one line's quantity, so only one row matched
        let err = check_consumed("store.cart_line", 2, 1).unwrap_err();
        assert!(matches!(err, RepositoryError::Stale(_)));
        assert_eq!(
            err.to_string(),
            "stale data: store.cart_line: 1 of 2 lines unchanged"
        );
    }
}
