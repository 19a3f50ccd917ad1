//! Order placement.
//!
//! Turns the caller's two carts (or, when both are empty, a single default
//! line for the hero product) into a stored order, then forwards it to the
//! print vendor and emails a confirmation. Neither of the last two steps can
//! fail the checkout.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use cwish_core::{OrderId, PrintPosition, UserId};

use crate::db::{CartRepository, ConsumedCartLines, OrderRepository, RepositoryError};
use crate::models::{
    BonusProduct, Cart, CatalogProduct, NewOrder, NewOrderItem, Order, Product, ShippingDetails,
};
use crate::state::AppState;

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Carts are empty and there is no hero product to fall back to.
    #[error("No active product available")]
    NoActiveProduct,

    #[error("Order items must share one currency")]
    MixedCurrencies,

    /// A cart line changed while the order was being placed.
    #[error("Your cart changed while the order was being placed. Please try again.")]
    CartChanged,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// The default line used when there is nothing in the carts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackLine {
    pub quantity: i32,
    pub print_position: Option<PrintPosition>,
    pub personalization: Option<String>,
}

impl Default for FallbackLine {
    fn default() -> Self {
        Self {
            quantity: 1,
            print_position: None,
            personalization: None,
        }
    }
}

/// A stored order together with the vendor's HTTP status.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    #[serde(flatten)]
    pub order: Order,
    pub shirtigo_status: Option<u16>,
}

fn non_blank(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
}

/// One order item per cart line, priced at the product's current price.
#[must_use]
pub fn items_from_cart<P: CatalogProduct>(cart: &Cart<P>) -> Vec<NewOrderItem> {
    cart.items
        .iter()
        .map(|line| {
            let price = line.product.unit_price();
            NewOrderItem {
                product: line.product.line_product(),
                product_name: line.product.name().to_string(),
                product_image: line.product.image_url().map(ToString::to_string),
                quantity: line.quantity,
                unit_price: price.amount,
                currency: price.currency_code,
                print_position: line.print_position,
                personalization: non_blank(line.customization.as_deref()),
            }
        })
        .collect()
}

/// The single hero-product item used when the carts are empty.
#[must_use]
pub fn fallback_item(product: &Product, line: &FallbackLine) -> NewOrderItem {
    let price = product.unit_price();
    NewOrderItem {
        product: product.line_product(),
        product_name: product.name().to_string(),
        product_image: product.image_url().map(ToString::to_string),
        quantity: line.quantity.max(1),
        unit_price: price.amount,
        currency: price.currency_code,
        print_position: line.print_position,
        personalization: non_blank(line.personalization.as_deref()),
    }
}

/// Distinct print positions in first-seen order, joined by `", "`.
#[must_use]
pub fn aggregate_print_positions(items: &[NewOrderItem]) -> Option<String> {
    let mut seen: Vec<&str> = Vec::new();
    for position in items.iter().filter_map(|item| item.print_position) {
        if !seen.contains(&position.as_str()) {
            seen.push(position.as_str());
        }
    }
    (!seen.is_empty()).then(|| seen.join(", "))
}

/// Item personalizations, joined by `" | "`.
#[must_use]
pub fn aggregate_personalizations(items: &[NewOrderItem]) -> Option<String> {
    let texts: Vec<&str> = items
        .iter()
        .filter_map(|item| item.personalization.as_deref())
        .filter(|text| !text.trim().is_empty())
        .collect();
    (!texts.is_empty()).then(|| texts.join(" | "))
}

/// Build an order from its items, computing the total and the aggregates.
///
/// # Errors
///
/// Returns `CheckoutError::NoActiveProduct` if there are no items and
/// `CheckoutError::MixedCurrencies` if the items are priced in different
/// currencies.
pub fn assemble_order(
    user_id: UserId,
    shipping: ShippingDetails,
    items: Vec<NewOrderItem>,
) -> Result<NewOrder, CheckoutError> {
    let currency = items
        .first()
        .map(|item| item.currency)
        .ok_or(CheckoutError::NoActiveProduct)?;
    if items.iter().any(|item| item.currency != currency) {
        return Err(CheckoutError::MixedCurrencies);
    }

    let total_amount = items
        .iter()
        .fold(Decimal::new(0, 2), |acc, item| acc + item.total_price());

    Ok(NewOrder {
        id: OrderId::generate(),
        user_id,
        shipping,
        currency,
        total_amount,
        print_positions: aggregate_print_positions(&items),
        personalizations: aggregate_personalizations(&items),
        items,
    })
}

/// Order placement service.
pub struct CheckoutService<'a> {
    state: &'a AppState,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Place an order from the user's carts, consuming them.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NoActiveProduct` when the carts are empty and
    /// there is no hero product, or a repository error if storing fails.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn place_from_carts(
        &self,
        user_id: UserId,
        shipping: ShippingDetails,
        fallback: &FallbackLine,
    ) -> Result<PlacedOrder, CheckoutError> {
        let carts = CartRepository::new(self.state.pool());
        let main = carts.list::<Product>(user_id).await?;
        let bonus = carts.list::<BonusProduct>(user_id).await?;

        let consumed = ConsumedCartLines::from_carts(&main, &bonus);

        let mut items = items_from_cart(&main);
        items.extend(items_from_cart(&bonus));
        if items.is_empty() {
            debug!("Carts are empty, using fallback line");
            items.push(self.fallback(fallback).await?);
        }

        let order = assemble_order(user_id, shipping, items)?;
        self.place(order, &consumed).await
    }

    /// Place a one-line order for the hero product without touching the carts.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NoActiveProduct` if there is no hero product,
    /// or a repository error if storing fails.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn place_test_order(
        &self,
        user_id: UserId,
        shipping: ShippingDetails,
        line: &FallbackLine,
    ) -> Result<PlacedOrder, CheckoutError> {
        let item = self.fallback(line).await?;
        let order = assemble_order(user_id, shipping, vec![item])?;
        self.place(order, &ConsumedCartLines::default()).await
    }

    async fn fallback(&self, line: &FallbackLine) -> Result<NewOrderItem, CheckoutError> {
        let product = self
            .state
            .catalog()
            .active::<Product>(self.state.pool())
            .await?
            .ok_or(CheckoutError::NoActiveProduct)?;
        Ok(fallback_item(&product, line))
    }

    async fn place(
        &self,
        order: NewOrder,
        consumed: &ConsumedCartLines,
    ) -> Result<PlacedOrder, CheckoutError> {
        let orders = OrderRepository::new(self.state.pool());
        let mut order = orders
            .create(&order, consumed)
            .await
            .map_err(|err| match err {
                RepositoryError::Stale(detail) => {
                    warn!(%detail, "Cart changed during checkout");
                    CheckoutError::CartChanged
                }
                other => other.into(),
            })?;
        info!(
            order_id = %order.id,
            items = order.items.len(),
            total = %order.total_amount,
            "Order created"
        );

        let shirtigo_status = self.fulfill(&orders, &mut order).await;
        self.notify(&order).await;

        Ok(PlacedOrder {
            order,
            shirtigo_status,
        })
    }

    /// Forward to the print vendor and store its answer on the order.
    async fn fulfill(&self, orders: &OrderRepository<'_>, order: &mut Order) -> Option<u16> {
        let Some(client) = self.state.shirtigo() else {
            debug!("Shirtigo not configured, skipping fulfillment");
            return None;
        };
        let outcome = client.fulfill(order).await?;

        if let Err(err) = orders
            .record_fulfillment(
                order.id,
                outcome.vendor_order_id.as_deref(),
                &outcome.response,
            )
            .await
        {
            error!(order_id = %order.id, error = %err, "Failed to store Shirtigo response");
        } else {
            order.shirtigo_order_id = outcome.vendor_order_id;
            order.shirtigo_response = Some(outcome.response);
        }

        outcome.status
    }

    async fn notify(&self, order: &Order) {
        let Some(email) = self.state.email() else {
            info!(order_id = %order.id, "Email not configured, skipping order confirmation");
            return;
        };
        if let Err(err) = email.send_order_confirmation(order).await {
            warn!(order_id = %order.id, error = %err, "Failed to send order confirmation");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use cwish_core::{CartLineId, CurrencyCode};

    use super::*;
    use crate::models::CartLine;
    use crate::models::OrderLineProduct;
    use crate::models::order::fixtures::shipping;
    use crate::models::product::fixtures::{bonus_product, product};

    fn line<P: CatalogProduct>(
        id: i32,
        product: P,
        quantity: i32,
        customization: Option<&str>,
        print_position: Option<PrintPosition>,
    ) -> CartLine<P> {
        CartLine::new(
            CartLineId::new(id),
            product,
            quantity,
            customization.map(ToString::to_string),
            print_position,
            Utc::now(),
            Utc::now(),
        )
    }

    #[test]
    fn test_consumed_lines_keep_ordered_quantities() {
        let main = Cart::from_lines(vec![
            line(7, product(Decimal::new(2500, 2)), 2, None, None),
            line(8, product(Decimal::new(2500, 2)), 1, None, None),
        ]);
        let bonus = Cart::from_lines(vec![line(3, bonus_product(Decimal::new(500, 2)), 4, None, None)]);

        let consumed = ConsumedCartLines::from_carts(&main, &bonus);
        let quantities: Vec<(i32, i32)> = consumed
            .main
            .iter()
            .chain(&consumed.bonus)
            .map(|line| (line.id.as_i32(), line.quantity))
            .collect();
        assert_eq!(quantities, vec![(7, 2), (8, 1), (3, 4)]);
    }

    #[test]
    fn test_stale_cart_is_a_conflict() {
        let err = CheckoutError::CartChanged;
        assert!(err.to_string().starts_with("Your cart changed"));
    }

    #[test]
    fn test_items_from_both_carts() {
        let main = Cart::from_lines(vec![line(
            1,
            product(Decimal::new(2500, 2)),
            2,
            Some("ADA"),
            Some(PrintPosition::Back),
        )]);
        let bonus = Cart::from_lines(vec![line(
            2,
            bonus_product(Decimal::new(500, 2)),
            1,
            None,
            None,
        )]);

        let mut items = items_from_cart(&main);
        items.extend(items_from_cart(&bonus));

        assert_eq!(items.len(), 2);
        assert!(matches!(items[0].product, OrderLineProduct::Single(_)));
        assert_eq!(items[0].personalization.as_deref(), Some("ADA"));
        assert_eq!(items[0].total_price(), Decimal::new(5000, 2));
        assert!(matches!(items[1].product, OrderLineProduct::Bonus(_)));
        assert_eq!(items[1].product_name, "Nectar Recipe eBook");

        let order = assemble_order(UserId::new(7), shipping(), items).unwrap();
        assert_eq!(order.total_amount, Decimal::new(5500, 2));
        assert_eq!(order.currency, CurrencyCode::USD);
        assert_eq!(order.print_positions.as_deref(), Some("back"));
        assert_eq!(order.personalizations.as_deref(), Some("ADA"));
    }

    #[test]
    fn test_total_equals_sum_of_items() {
        let items = vec![
            fallback_item(
                &product(Decimal::new(1999, 2)),
                &FallbackLine {
                    quantity: 3,
                    ..FallbackLine::default()
                },
            ),
            items_from_cart(&Cart::from_lines(vec![line(
                4,
                bonus_product(Decimal::new(250, 2)),
                2,
                None,
                None,
            )]))
            .remove(0),
        ];
        let expected: Decimal = items.iter().map(NewOrderItem::total_price).sum();

        let order = assemble_order(UserId::new(1), shipping(), items).unwrap();
        assert_eq!(order.total_amount, expected);
        assert_eq!(order.total_amount, Decimal::new(6497, 2));
    }

    #[test]
    fn test_fallback_line_uses_payload() {
        let item = fallback_item(
            &product(Decimal::new(2500, 2)),
            &FallbackLine {
                quantity: 0,
                print_position: Some(PrintPosition::FrontAndBack),
                personalization: Some("  Grace  ".to_string()),
            },
        );
        assert_eq!(item.quantity, 1);
        assert_eq!(item.print_position, Some(PrintPosition::FrontAndBack));
        assert_eq!(item.personalization.as_deref(), Some("Grace"));
        assert_eq!(item.unit_price, Decimal::new(2500, 2));
    }

    #[test]
    fn test_aggregates_distinct_positions_in_order() {
        let p = product(Decimal::ONE);
        let make = |pos, text: Option<&str>| {
            fallback_item(
                &p,
                &FallbackLine {
                    quantity: 1,
                    print_position: pos,
                    personalization: text.map(ToString::to_string),
                },
            )
        };
        let items = vec![
            make(Some(PrintPosition::Back), Some("A")),
            make(None, Some("   ")),
            make(Some(PrintPosition::Front), None),
            make(Some(PrintPosition::Back), Some("B")),
        ];
        assert_eq!(
            aggregate_print_positions(&items).as_deref(),
            Some("back, front")
        );
        assert_eq!(aggregate_personalizations(&items).as_deref(), Some("A | B"));
    }

    #[test]
    fn test_aggregates_empty_are_none() {
        let items = vec![fallback_item(
            &product(Decimal::ONE),
            &FallbackLine::default(),
        )];
        assert_eq!(aggregate_print_positions(&items), None);
        assert_eq!(aggregate_personalizations(&items), None);
    }

    #[test]
    fn test_no_items_is_no_active_product() {
        assert!(matches!(
            assemble_order(UserId::new(1), shipping(), Vec::new()),
            Err(CheckoutError::NoActiveProduct)
        ));
    }

    #[test]
    fn test_mixed_currencies_rejected() {
        let mut euro = bonus_product(Decimal::ONE);
        euro.currency = CurrencyCode::EUR;
        let mut items = items_from_cart(&Cart::from_lines(vec![line(
            1,
            product(Decimal::ONE),
            1,
            None,
            None,
        )]));
        items.extend(items_from_cart(&Cart::from_lines(vec![line(
            2, euro, 1, None, None,
        )])));

        assert!(matches!(
            assemble_order(UserId::new(1), shipping(), items),
            Err(CheckoutError::MixedCurrencies)
        ));
    }

    #[test]
    fn test_placed_order_serializes_flat() {
        let placed = PlacedOrder {
            order: crate::models::order::fixtures::order(),
            shirtigo_status: Some(201),
        };
        let json = serde_json::to_value(&placed).unwrap();
        assert_eq!(json["shirtigo_status"], 201);
        assert_eq!(json["first_name"], "Ada");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["items"][0]["product_type"], "single");
    }
}
