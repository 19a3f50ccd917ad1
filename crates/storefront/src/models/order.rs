//! Orders and order items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use cwish_core::{
    BonusProductId, CurrencyCode, Email, OrderId, OrderItemId, OrderStatus, PrintPosition,
    ProductId, UserId,
};

/// The product an order item refers to: exactly one of the two catalogs.
///
/// Serializes as `{"product_type": "single", "product_id": 1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "product_type", content = "product_id", rename_all = "snake_case")]
pub enum OrderLineProduct {
    Single(ProductId),
    Bonus(BonusProductId),
}

impl OrderLineProduct {
    /// Rebuild from the two nullable foreign-key columns.
    ///
    /// Returns `None` unless exactly one of them is set.
    #[must_use]
    pub const fn from_columns(
        product_id: Option<ProductId>,
        bonus_product_id: Option<BonusProductId>,
    ) -> Option<Self> {
        match (product_id, bonus_product_id) {
            (Some(id), None) => Some(Self::Single(id)),
            (None, Some(id)) => Some(Self::Bonus(id)),
            _ => None,
        }
    }

    /// Split into the two foreign-key columns for insertion.
    #[must_use]
    pub const fn columns(self) -> (Option<ProductId>, Option<BonusProductId>) {
        match self {
            Self::Single(id) => (Some(id), None),
            Self::Bonus(id) => (None, Some(id)),
        }
    }
}

/// Where and to whom an order ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingDetails {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub postal_code: String,
    pub phone: Option<String>,
}

impl ShippingDetails {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    #[serde(flatten)]
    pub product: OrderLineProduct,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub print_position: Option<PrintPosition>,
    pub personalization: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    #[serde(flatten)]
    pub shipping: ShippingDetails,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub currency: CurrencyCode,
    pub shirtigo_order_id: Option<String>,
    pub shirtigo_response: Option<serde_json::Value>,
    pub print_positions: Option<String>,
    pub personalizations: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// An order item before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product: OrderLineProduct,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub currency: CurrencyCode,
    pub print_position: Option<PrintPosition>,
    pub personalization: Option<String>,
}

impl NewOrderItem {
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// An order before it is stored. Built by [`crate::services::checkout`],
/// which keeps `total_amount` equal to the sum of the item totals.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub user_id: UserId,
    pub shipping: ShippingDetails,
    pub currency: CurrencyCode,
    pub total_amount: Decimal,
    pub print_positions: Option<String>,
    pub personalizations: Option<String>,
    pub items: Vec<NewOrderItem>,
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_columns_requires_exactly_one() {
        assert_eq!(
            OrderLineProduct::from_columns(Some(ProductId::new(1)), None),
            Some(OrderLineProduct::Single(ProductId::new(1)))
        );
        assert_eq!(
            OrderLineProduct::from_columns(None, Some(BonusProductId::new(2))),
            Some(OrderLineProduct::Bonus(BonusProductId::new(2)))
        );
        assert_eq!(OrderLineProduct::from_columns(None, None), None);
        assert_eq!(
            OrderLineProduct::from_columns(Some(ProductId::new(1)), Some(BonusProductId::new(2))),
            None
        );
    }

    #[test]
    fn test_order_item_serializes_product_tag() {
        let item = OrderItem {
            id: OrderItemId::new(9),
            product: OrderLineProduct::Bonus(BonusProductId::new(4)),
            product_name: "Nectar Recipe eBook".to_string(),
            product_image: None,
            quantity: 2,
            unit_price: Decimal::new(500, 2),
            total_price: Decimal::new(1000, 2),
            print_position: None,
            personalization: None,
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["product_type"], "bonus");
        assert_eq!(json["product_id"], 4);
        assert_eq!(json["total_price"], "10.00");
    }
}
