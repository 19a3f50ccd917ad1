//! Cart route handlers.
//!
//! The main cart and the bonus cart behave identically; each handler is
//! generic over the catalog it holds. Every mutation targets the catalog's
//! active product and answers with the updated cart.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;
use validator::Validate;

use cwish_core::{PrintPosition, ProductKind};

use crate::db::{CartRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::ValidatedJson;
use crate::middleware::RequireAuth;
use crate::models::Cart;
use crate::services::catalog::CachedCatalog;
use crate::state::AppState;

const fn default_quantity() -> i32 {
    1
}

/// Body of `add_to_cart`.
#[derive(Debug, Deserialize, Validate)]
pub struct AddToCartRequest {
    #[serde(default = "default_quantity")]
    #[validate(range(
        min = 1,
        max = 999,
        message = "Ensure this value is between 1 and 999."
    ))]
    pub quantity: i32,
    #[validate(length(max = 500, message = "Ensure this field has no more than 500 characters."))]
    pub customization: Option<String>,
    pub print_position: Option<PrintPosition>,
}

/// Body of `update_quantity`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    #[validate(range(
        min = 0,
        max = 999,
        message = "Ensure this value is between 0 and 999."
    ))]
    pub quantity: i32,
}

const fn empty_cart_message(kind: ProductKind) -> &'static str {
    match kind {
        ProductKind::Single => "No items in cart",
        ProductKind::Bonus => "No bonus items in cart",
    }
}

const fn cleared_message(kind: ProductKind) -> &'static str {
    match kind {
        ProductKind::Single => "Cart cleared successfully",
        ProductKind::Bonus => "Bonus cart cleared successfully",
    }
}

async fn active_product<P: CachedCatalog>(state: &AppState) -> Result<P> {
    state
        .catalog()
        .active::<P>(state.pool())
        .await?
        .ok_or_else(super::products::no_active::<P>)
}

/// The caller's cart.
///
/// GET /api/cart, GET /api/bonus-cart
#[instrument(skip(state, user), fields(kind = %P::KIND, user_id = %user.id))]
pub async fn list<P: CachedCatalog>(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Cart<P>>> {
    let cart = CartRepository::new(state.pool()).list::<P>(user.id).await?;
    Ok(Json(cart))
}

/// Add the active product to the caller's cart.
///
/// POST /api/cart/add_to_cart
///
/// An existing line has its quantity incremented; a supplied customization
/// or print position replaces the stored one.
#[instrument(skip(state, user, body), fields(kind = %P::KIND, user_id = %user.id))]
pub async fn add_to_cart<P: CachedCatalog>(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ValidatedJson(body): ValidatedJson<AddToCartRequest>,
) -> Result<Json<Cart<P>>> {
    let product = active_product::<P>(&state).await?;
    let customization = body
        .customization
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty());

    let carts = CartRepository::new(state.pool());
    carts
        .add::<P>(
            user.id,
            product.row_id(),
            body.quantity,
            customization,
            body.print_position,
        )
        .await?;
    tracing::info!(quantity = body.quantity, "Added to cart");

    Ok(Json(carts.list::<P>(user.id).await?))
}

/// Set the quantity of the active product in the caller's cart.
///
/// POST /api/cart/update_quantity
///
/// A quantity of zero removes the line.
#[instrument(skip(state, user, body), fields(kind = %P::KIND, user_id = %user.id))]
pub async fn update_quantity<P: CachedCatalog>(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ValidatedJson(body): ValidatedJson<UpdateQuantityRequest>,
) -> Result<Json<Cart<P>>> {
    let product = active_product::<P>(&state).await?;

    let carts = CartRepository::new(state.pool());
    match carts
        .set_quantity::<P>(user.id, product.row_id(), body.quantity)
        .await
    {
        Ok(()) => {}
        Err(RepositoryError::NotFound) => {
            return Err(AppError::NotFound(
                empty_cart_message(P::KIND).to_string(),
            ));
        }
        Err(err) => return Err(err.into()),
    }

    Ok(Json(carts.list::<P>(user.id).await?))
}

/// Remove every line from the caller's cart.
///
/// POST /api/cart/clear_cart
#[instrument(skip(state, user), fields(kind = %P::KIND, user_id = %user.id))]
pub async fn clear_cart<P: CachedCatalog>(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    let removed = CartRepository::new(state.pool()).clear::<P>(user.id).await?;
    tracing::debug!(removed, "Cart cleared");
    Ok(Json(json!({ "message": cleared_message(P::KIND) })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::extract::field_errors;
    use crate::routes::test_support::{json_body, json_request, send};

    fn parse_add(body: &str) -> std::result::Result<AddToCartRequest, validator::ValidationErrors> {
        let request: AddToCartRequest = serde_json::from_str(body).unwrap();
        request.validate().map(|()| request)
    }

    #[test]
    fn test_add_defaults_to_one() {
        let request = parse_add("{}").unwrap();
        assert_eq!(request.quantity, 1);
        assert!(request.customization.is_none());
        assert!(request.print_position.is_none());
    }

    #[test]
    fn test_add_rejects_zero() {
        let errors = parse_add(r#"{"quantity": 0}"#).unwrap_err();
        assert!(errors.field_errors().contains_key("quantity"));
    }

    #[test]
    fn test_add_accepts_print_position() {
        let request =
            parse_add(r#"{"quantity": 2, "customization": "ADA", "print_position": "front_and_back"}"#)
                .unwrap();
        assert_eq!(request.print_position, Some(PrintPosition::FrontAndBack));
        assert_eq!(request.customization.as_deref(), Some("ADA"));
    }

    #[test]
    fn test_update_allows_zero_but_not_negative() {
        let zero: UpdateQuantityRequest = serde_json::from_str(r#"{"quantity": 0}"#).unwrap();
        assert!(zero.validate().is_ok());
        let negative: UpdateQuantityRequest = serde_json::from_str(r#"{"quantity": -1}"#).unwrap();
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_quantities_are_capped() {
        use crate::models::MAX_LINE_QUANTITY;

        let most = format!(r#"{{"quantity": {MAX_LINE_QUANTITY}}}"#);
        let too_many = format!(r#"{{"quantity": {}}}"#, MAX_LINE_QUANTITY + 1);

        assert!(parse_add(&most).is_ok());
        let errors = field_errors(&parse_add(&too_many).unwrap_err());
        assert_eq!(
            errors["quantity"],
            vec!["Ensure this value is between 1 and 999."]
        );

        let update: UpdateQuantityRequest = serde_json::from_str(&too_many).unwrap();
        assert!(update.validate().is_err());
        let update: UpdateQuantityRequest = serde_json::from_str(&most).unwrap();
        assert!(update.validate().is_ok());
    }

    #[test]
    fn test_messages_per_kind() {
        assert_eq!(empty_cart_message(ProductKind::Single), "No items in cart");
        assert_eq!(empty_cart_message(ProductKind::Bonus), "No bonus items in cart");
        assert_eq!(cleared_message(ProductKind::Single), "Cart cleared successfully");
        assert_eq!(
            cleared_message(ProductKind::Bonus),
            "Bonus cart cleared successfully"
        );
    }

    #[tokio::test]
    async fn test_mutations_require_login() {
        for uri in [
            "/api/cart/add_to_cart/",
            "/api/bonus-cart/update_quantity/",
            "/api/bonus-cart/clear_cart/",
        ] {
            let response = send(json_request("POST", uri, r#"{"quantity": 1}"#)).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
            let body = json_body(response).await;
            assert!(body["error"].is_string());
        }
    }
}
