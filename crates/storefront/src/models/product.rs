//! Catalog products.
//!
//! The store sells one hero product ([`Product`]) and one digital add-on
//! ([`BonusProduct`]). Each lives in its own table and has its own cart;
//! [`CatalogProduct`] is what cart and checkout code is generic over.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use cwish_core::{BonusProductId, CurrencyCode, Price, ProductId, ProductKind};

use super::OrderLineProduct;

/// The hero product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub currency: CurrencyCode,
    #[serde(rename = "image")]
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The digital bonus product.
#[derive(Debug, Clone, Serialize)]
pub struct BonusProduct {
    pub id: BonusProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub currency: CurrencyCode,
    #[serde(rename = "image")]
    pub image_url: Option<String>,
    pub is_active: bool,
    pub is_digital: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Behaviour shared by both product kinds.
pub trait CatalogProduct: Clone + Serialize + Send + Sync + Unpin + 'static {
    const KIND: ProductKind;

    /// Wording used in "No active ... available" errors.
    const LABEL: &'static str;

    /// Primary key of the catalog row.
    fn row_id(&self) -> i32;

    fn name(&self) -> &str;

    fn image_url(&self) -> Option<&str>;

    fn unit_price(&self) -> Price;

    /// The reference an order item stores for this product.
    fn line_product(&self) -> OrderLineProduct;
}

impl CatalogProduct for Product {
    const KIND: ProductKind = ProductKind::Single;
    const LABEL: &'static str = "product";

    fn row_id(&self) -> i32 {
        self.id.as_i32()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    fn unit_price(&self) -> Price {
        Price::new(self.price, self.currency)
    }

    fn line_product(&self) -> OrderLineProduct {
        OrderLineProduct::Single(self.id)
    }
}

impl CatalogProduct for BonusProduct {
    const KIND: ProductKind = ProductKind::Bonus;
    const LABEL: &'static str = "bonus product";

    fn row_id(&self) -> i32 {
        self.id.as_i32()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    fn unit_price(&self) -> Price {
        Price::new(self.price, self.currency)
    }

    fn line_product(&self) -> OrderLineProduct {
        OrderLineProduct::Bonus(self.id)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn product(price: Decimal) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Magic Nectar Tee".to_string(),
            description: "Hummingbird print on organic cotton".to_string(),
            price,
            currency: CurrencyCode::USD,
            image_url: Some("https://cdn.cwish.shop/tee.jpg".to_string()),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn bonus_product(price: Decimal) -> BonusProduct {
        BonusProduct {
            id: BonusProductId::new(1),
            name: "Nectar Recipe eBook".to_string(),
            description: "Digital download".to_string(),
            price,
            currency: CurrencyCode::USD,
            image_url: None,
            is_active: true,
            is_digital: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_product_serializes_image_key() {
        let json = serde_json::to_value(product(Decimal::new(2500, 2))).unwrap();
        assert_eq!(json["image"], "https://cdn.cwish.shop/tee.jpg");
        assert_eq!(json["price"], "25.00");
        assert_eq!(json["currency"], "USD");
        assert!(json.get("is_digital").is_none());
    }

    #[test]
    fn test_line_product_kind() {
        assert_eq!(
            product(Decimal::ONE).line_product(),
            OrderLineProduct::Single(ProductId::new(1))
        );
        assert_eq!(
            bonus_product(Decimal::ONE).line_product(),
            OrderLineProduct::Bonus(BonusProductId::new(1))
        );
    }
}
