//! Shirtigo print-on-demand client.
//!
//! Placed orders with at least one printed item are forwarded to
//! `POST {api_url}/orders`. Whatever the vendor answers, including failures,
//! is reduced to a [`FulfillmentOutcome`] that is stored on the order.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{info, instrument, warn};

use cwish_core::PrintPosition;

use crate::config::ShirtigoConfig;
use crate::models::{Order, OrderLineProduct};

/// Errors that can occur when interacting with the Shirtigo API.
#[derive(Debug, Error)]
pub enum ShirtigoError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status}")]
    Api { status: u16, body: Value },

    /// Client could not be configured.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result of forwarding an order, as persisted on the order row.
#[derive(Debug, Clone, PartialEq)]
pub struct FulfillmentOutcome {
    /// Vendor HTTP status; `None` when no response was received.
    pub status: Option<u16>,
    pub vendor_order_id: Option<String>,
    pub response: Value,
}

impl FulfillmentOutcome {
    fn from_error(err: &ShirtigoError) -> Self {
        match err {
            ShirtigoError::Api { status, body } => Self {
                status: Some(*status),
                vendor_order_id: None,
                response: json!({
                    "error": format!("Shirtigo API returned {status}"),
                    "status": status,
                    "body": body,
                }),
            },
            other => Self {
                status: None,
                vendor_order_id: None,
                response: json!({ "error": other.to_string(), "status": null }),
            },
        }
    }
}

/// Order payload for `POST /orders`.
#[derive(Debug, Serialize)]
pub struct OrderPayload {
    pub reference: String,
    pub delivery: Delivery,
    pub products: Vec<ProductPayload>,
}

#[derive(Debug, Serialize)]
pub struct Delivery {
    pub firstname: String,
    pub lastname: String,
    pub street: String,
    pub postcode: String,
    pub city: String,
    pub country: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductPayload {
    pub base_product_id: String,
    pub amount: i32,
    pub processings: Vec<Processing>,
}

#[derive(Debug, Serialize)]
pub struct Processing {
    pub position: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

fn processings(position: PrintPosition, text: Option<&str>) -> Vec<Processing> {
    let positions: &[&'static str] = match position {
        PrintPosition::Front => &["front"],
        PrintPosition::Back => &["back"],
        PrintPosition::FrontAndBack => &["front", "back"],
    };
    positions
        .iter()
        .map(|&position| Processing {
            position,
            text: text.map(ToString::to_string),
        })
        .collect()
}

/// Build the vendor payload for an order.
///
/// Only single-product items are printed; returns `None` when the order has
/// none (a bonus-only order is entirely digital).
#[must_use]
pub fn build_payload(order: &Order, base_product_id: &str) -> Option<OrderPayload> {
    let products: Vec<ProductPayload> = order
        .items
        .iter()
        .filter(|item| matches!(item.product, OrderLineProduct::Single(_)))
        .map(|item| ProductPayload {
            base_product_id: base_product_id.to_string(),
            amount: item.quantity,
            processings: processings(
                item.print_position.unwrap_or_default(),
                item.personalization.as_deref().filter(|p| !p.trim().is_empty()),
            ),
        })
        .collect();

    if products.is_empty() {
        return None;
    }

    let shipping = &order.shipping;
    Some(OrderPayload {
        reference: order.id.to_string(),
        delivery: Delivery {
            firstname: shipping.first_name.clone(),
            lastname: shipping.last_name.clone(),
            street: shipping.address.clone(),
            postcode: shipping.postal_code.clone(),
            city: shipping.city.clone(),
            country: shipping.country.clone(),
            email: shipping.email.to_string(),
            phone: shipping.phone.clone(),
        },
        products,
    })
}

/// Pull the vendor's order id out of a response body.
///
/// Accepts `id` or `reference`, at the top level or under `data`, as a string
/// or a number.
#[must_use]
pub fn vendor_order_id(body: &Value) -> Option<String> {
    let scopes = [body.get("data"), Some(body)];
    scopes
        .into_iter()
        .flatten()
        .flat_map(|scope| [scope.get("id"), scope.get("reference")])
        .flatten()
        .find_map(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Shirtigo API client.
#[derive(Clone)]
pub struct ShirtigoClient {
    client: reqwest::Client,
    api_url: String,
    product_id: String,
}

impl ShirtigoClient {
    /// Create a new Shirtigo API client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ShirtigoConfig) -> Result<Self, ShirtigoError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_token.expose_secret());
        let mut auth_value = HeaderValue::from_str(&auth_value)
            .map_err(|e| ShirtigoError::Config(format!("Invalid API token format: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            product_id: config.product_id.clone(),
        })
    }

    /// Submit a payload and return the vendor's status and body.
    ///
    /// # Errors
    ///
    /// Returns `ShirtigoError::Http` if no response is received and
    /// `ShirtigoError::Api` for non-success statuses.
    pub async fn create_order(&self, payload: &OrderPayload) -> Result<(u16, Value), ShirtigoError> {
        let url = format!("{}/orders", self.api_url);

        let response = self.client.post(&url).json(payload).send().await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if !status.is_success() {
            return Err(ShirtigoError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok((status.as_u16(), body))
    }

    /// Forward an order for printing.
    ///
    /// Never fails: vendor errors are folded into the outcome. Returns `None`
    /// when the order has nothing to print.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn fulfill(&self, order: &Order) -> Option<FulfillmentOutcome> {
        let payload = build_payload(order, &self.product_id)?;

        match self.create_order(&payload).await {
            Ok((status, body)) => {
                let vendor_order_id = vendor_order_id(&body);
                info!(status, vendor_order_id = ?vendor_order_id, "Order sent to Shirtigo");
                Some(FulfillmentOutcome {
                    status: Some(status),
                    vendor_order_id,
                    response: body,
                })
            }
            Err(err) => {
                warn!(error = %err, "Shirtigo order submission failed");
                Some(FulfillmentOutcome::from_error(&err))
            }
        }
    }
}
