//! Seed the catalog with its hero and bonus products.
//!
//! Each catalog is only seeded while it is empty, so the command is safe to
//! re-run after deploys.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;

use cwish_core::{CurrencyCode, ProductKind};
use cwish_storefront::db::{CatalogTable, NewProduct, ProductRepository};
use cwish_storefront::models::{BonusProduct, Product};

use super::{CommandError, connect};

/// Default hero product.
fn default_product() -> NewProduct {
    NewProduct {
        name: "Magic Nectar Tee".to_string(),
        description: "Organic cotton tee printed to order, with optional personalization."
            .to_string(),
        price: Decimal::new(2500, 2),
        currency: CurrencyCode::USD,
        image_url: None,
    }
}

/// Default bonus product.
fn default_bonus_product() -> NewProduct {
    NewProduct {
        name: "Nectar Recipe eBook".to_string(),
        description: "Digital guide to homemade hummingbird nectar.".to_string(),
        price: Decimal::new(500, 2),
        currency: CurrencyCode::USD,
        image_url: None,
    }
}

/// Overrides for the seeded product.
#[derive(Debug, Default)]
pub struct SeedOptions {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<CurrencyCode>,
    pub image_url: Option<String>,
}

impl SeedOptions {
    /// Apply the overrides to a default product.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Invalid` for a blank name or a negative price.
    pub fn apply(self, mut product: NewProduct) -> Result<NewProduct, CommandError> {
        if let Some(name) = self.name {
            if name.trim().is_empty() {
                return Err(CommandError::Invalid("name cannot be blank".to_string()));
            }
            product.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            if price.is_sign_negative() {
                return Err(CommandError::Invalid("price cannot be negative".to_string()));
            }
            product.price = price.round_dp(2);
        }
        if let Some(currency) = self.currency {
            product.currency = currency;
        }
        if self.image_url.is_some() {
            product.image_url = self.image_url;
        }
        Ok(product)
    }
}

async fn seed_catalog<P: CatalogTable>(
    pool: &PgPool,
    product: &NewProduct,
) -> Result<bool, CommandError> {
    let products = ProductRepository::new(pool);
    let existing = products.count::<P>().await?;
    if existing > 0 {
        info!(kind = %P::KIND, existing, "Catalog already seeded, skipping");
        return Ok(false);
    }

    products.create::<P>(product).await?;
    info!(kind = %P::KIND, name = %product.name, price = %product.price, "Seeded product");
    Ok(true)
}

/// Seed one catalog (or both when `kind` is `None`).
///
/// Overrides only make sense for a single catalog and are rejected otherwise.
///
/// # Errors
///
/// Returns an error if the options are invalid or a database operation fails.
pub async fn run(kind: Option<ProductKind>, options: SeedOptions) -> Result<(), CommandError> {
    let plan = match kind {
        Some(ProductKind::Single) => vec![(ProductKind::Single, options.apply(default_product())?)],
        Some(ProductKind::Bonus) => vec![(
            ProductKind::Bonus,
            options.apply(default_bonus_product())?,
        )],
        None => {
            if options.name.is_some() || options.price.is_some() {
                return Err(CommandError::Invalid(
                    "choose `single` or `bonus` to override product fields".to_string(),
                ));
            }
            vec![
                (ProductKind::Single, default_product()),
                (ProductKind::Bonus, default_bonus_product()),
            ]
        }
    };

    let pool = connect().await?;
    for (kind, product) in &plan {
        match kind {
            ProductKind::Single => seed_catalog::<Product>(&pool, product).await?,
            ProductKind::Bonus => seed_catalog::<BonusProduct>(&pool, product).await?,
        };
    }
    Ok(())
}
