//! Per-user carts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use cwish_core::{CartLineId, PrintPosition};

use super::CatalogProduct;

/// Most units a single cart line or order line may hold.
pub const MAX_LINE_QUANTITY: i32 = 999;

/// One (user, product) line in a cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine<P> {
    pub id: CartLineId,
    pub product: P,
    pub quantity: i32,
    pub customization: Option<String>,
    pub print_position: Option<PrintPosition>,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<P: CatalogProduct> CartLine<P> {
    #[must_use]
    pub fn new(
        id: CartLineId,
        product: P,
        quantity: i32,
        customization: Option<String>,
        print_position: Option<PrintPosition>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let total_price = product.unit_price().times(quantity).amount;
        Self {
            id,
            product,
            quantity,
            customization,
            print_position,
            total_price,
            created_at,
            updated_at,
        }
    }
}

/// A user's cart for one product kind, with its totals.
#[derive(Debug, Clone, Serialize)]
pub struct Cart<P> {
    pub items: Vec<CartLine<P>>,
    pub total_amount: Decimal,
    pub item_count: i64,
}

impl<P: CatalogProduct> Cart<P> {
    #[must_use]
    pub fn from_lines(items: Vec<CartLine<P>>) -> Self {
        let total_amount = items
            .iter()
            .fold(Decimal::new(0, 2), |acc, line| acc + line.total_price);
        let item_count = items.iter().map(|line| i64::from(line.quantity)).sum();
        Self {
            items,
            total_amount,
            item_count,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::product::fixtures::product;

    fn line(id: i32, quantity: i32, price: Decimal) -> CartLine<crate::models::Product> {
        CartLine::new(
            CartLineId::new(id),
            product(price),
            quantity,
            None,
            None,
            Utc::now(),
            Utc::now(),
        )
    }

    #[test]
    fn test_line_total_is_quantity_times_price() {
        let line = line(1, 3, Decimal::new(2500, 2));
        assert_eq!(line.total_price, Decimal::new(7500, 2));
    }

    #[test]
    fn test_cart_totals() {
        let cart = Cart::from_lines(vec![
            line(1, 2, Decimal::new(2500, 2)),
            line(2, 1, Decimal::new(999, 2)),
        ]);
        assert_eq!(cart.total_amount, Decimal::new(5999, 2));
        assert_eq!(cart.item_count, 3);
    }

    #[test]
    fn test_empty_cart_serializes_zero_total() {
        let cart: Cart<crate::models::Product> = Cart::from_lines(Vec::new());
        assert!(cart.is_empty());
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["total_amount"], "0.00");
        assert_eq!(json["item_count"], 0);
        assert_eq!(json["items"], serde_json::json!([]));
    }
}
