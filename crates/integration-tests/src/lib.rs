//! End-to-end tests for the Cwish storefront API.
//!
//! # Running Tests
//!
//! ```bash
//! cwish-cli migrate && cwish-cli seed
//! cargo run -p cwish-storefront &
//! cargo test -p cwish-integration-tests -- --ignored
//! ```
//!
//! `STOREFRONT_TEST_URL` points the tests at another server
//! (default: `http://127.0.0.1:8000`).

use reqwest::{Client, Response};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL of the storefront under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFRONT_TEST_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string())
}

/// Absolute URL for an API path.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url())
}

/// A client that keeps the session cookie between requests.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A username no other test run has used.
#[must_use]
pub fn unique_username() -> String {
    format!("it-{}", Uuid::new_v4().simple())
}

/// Sign up a fresh account; the client is logged in afterwards.
///
/// # Panics
///
/// Panics if the request fails or the server rejects the signup.
#[allow(clippy::expect_used)]
pub async fn signed_up_client() -> (Client, Value) {
    let client = client();
    let username = unique_username();
    let resp = client
        .post(url("/api/auth/signup/"))
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "correct horse battery",
        }))
        .send()
        .await
        .expect("Failed to sign up");
    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
    let user = resp.json().await.expect("Failed to read signup response");
    (client, user)
}

/// Shipping payload for order creation.
#[must_use]
pub fn shipping() -> Value {
    json!({
        "email": "ada@example.com",
        "first_name": "Ada",
        "last_name": "Lovelace",
        "address": "12 Analytical Row",
        "city": "London",
        "country": "GB",
        "postal_code": "N1 9GU",
    })
}

/// Read a JSON body.
///
/// # Panics
///
/// Panics if the body is not JSON.
#[allow(clippy::expect_used)]
pub async fn json_body(resp: Response) -> Value {
    resp.json().await.expect("Response body is not JSON")
}
