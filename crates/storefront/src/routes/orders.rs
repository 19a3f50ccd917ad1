//! Order route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;
use validator::Validate;

use cwish_core::{OrderId, OrderStatus, PrintPosition};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::extract::{
    JsonBody, PathParam, ValidatedJson, email_field, non_blank, optional_text, valid_email,
};
use crate::middleware::RequireAuth;
use crate::models::{Order, ShippingDetails};
use crate::services::checkout::{CheckoutService, FallbackLine, PlacedOrder};
use crate::state::AppState;

/// Body of order creation: the shipping address, plus the fallback line
/// used when the carts are empty.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[serde(default)]
    #[validate(custom(function = "valid_email"))]
    pub email: String,
    #[serde(default)]
    #[validate(
        custom(function = "non_blank"),
        length(max = 100, message = "Ensure this field has no more than 100 characters.")
    )]
    pub first_name: String,
    #[serde(default)]
    #[validate(
        custom(function = "non_blank"),
        length(max = 100, message = "Ensure this field has no more than 100 characters.")
    )]
    pub last_name: String,
    #[serde(default)]
    #[validate(custom(function = "non_blank"))]
    pub address: String,
    #[serde(default)]
    #[validate(
        custom(function = "non_blank"),
        length(max = 100, message = "Ensure this field has no more than 100 characters.")
    )]
    pub city: String,
    #[serde(default)]
    #[validate(
        custom(function = "non_blank"),
        length(max = 100, message = "Ensure this field has no more than 100 characters.")
    )]
    pub country: String,
    #[serde(default)]
    #[validate(
        custom(function = "non_blank"),
        length(max = 20, message = "Ensure this field has no more than 20 characters.")
    )]
    pub postal_code: String,
    #[validate(length(max = 20, message = "Ensure this field has no more than 20 characters."))]
    pub phone: Option<String>,
    #[validate(range(
        min = 1,
        max = 999,
        message = "Ensure this value is between 1 and 999."
    ))]
    pub quantity: Option<i32>,
    pub print_position: Option<PrintPosition>,
    #[validate(length(max = 500, message = "Ensure this field has no more than 500 characters."))]
    pub personalization: Option<String>,
}

impl CreateOrderRequest {
    /// Split into the shipping details and the fallback line.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the email is rejected by the domain type.
    pub fn into_parts(self) -> Result<(ShippingDetails, FallbackLine)> {
        let shipping = ShippingDetails {
            email: email_field("email", &self.email)?,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            country: self.country.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            phone: optional_text(self.phone),
        };
        let fallback = FallbackLine {
            quantity: self.quantity.unwrap_or(1),
            print_position: self.print_position,
            personalization: optional_text(self.personalization),
        };
        Ok((shipping, fallback))
    }
}

/// Body of `update_status`.
///
/// `status` is kept as raw JSON so that numbers, nulls and unknown names all
/// get the same answer.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: serde_json::Value,
}

impl UpdateStatusRequest {
    /// The requested status.
    ///
    /// # Errors
    ///
    /// Returns `400 Invalid status` for anything but a known status name.
    pub fn status(&self) -> Result<OrderStatus> {
        self.status
            .as_str()
            .and_then(|name| name.parse().ok())
            .ok_or_else(|| AppError::BadRequest("Invalid status".to_string()))
    }
}

fn order_not_found() -> AppError {
    AppError::NotFound("Not found.".to_string())
}

/// The caller's orders, newest first.
///
/// GET /api/orders
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

/// Place an order from the caller's carts.
///
/// POST /api/orders
///
/// Falls back to one hero-product line when both carts are empty. The
/// response carries the print vendor's HTTP status as `shirtigo_status`.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ValidatedJson(body): ValidatedJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let (shipping, fallback) = body.into_parts()?;
    let placed = CheckoutService::new(&state)
        .place_from_carts(user.id, shipping, &fallback)
        .await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

/// Place a one-line hero-product order without touching the carts.
///
/// POST /api/orders/test_create
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn test_create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ValidatedJson(body): ValidatedJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let (shipping, line) = body.into_parts()?;
    let placed = CheckoutService::new(&state)
        .place_test_order(user.id, shipping, &line)
        .await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

/// One of the caller's orders.
///
/// GET /api/orders/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    PathParam(id): PathParam<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get_for_user(user.id, id)
        .await?
        .map(Json)
        .ok_or_else(order_not_found)
}

/// Change the status of one of the caller's orders.
///
/// PATCH /api/orders/{id}/update_status
#[instrument(skip(state, user, body), fields(user_id = %user.id, status = %body.status))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    PathParam(id): PathParam<OrderId>,
    JsonBody(body): JsonBody<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    let status = body.status()?;

    let order = OrderRepository::new(state.pool())
        .update_status(user.id, id, status)
        .await?
        .ok_or_else(order_not_found)?;
    tracing::info!(order_id = %order.id, "Order status updated");
    Ok(Json(order))
}
