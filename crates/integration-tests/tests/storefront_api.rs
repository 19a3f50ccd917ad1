//! Integration tests for the storefront API.
//!
//! These tests require:
//! - A migrated and seeded `PostgreSQL` database
//! - The storefront server running (cargo run -p cwish-storefront)

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::json;

use cwish_integration_tests::{client, json_body, shipping, signed_up_client, url};

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health() {
    let resp = client().get(url("/health/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["status"], "healthy");

    let resp = client().get(url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_catalog_is_public() {
    let resp = client().get(url("/api/product/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let product = json_body(resp).await;
    assert_eq!(product["is_active"], true);

    let id = product["id"].as_i64().unwrap();
    let resp = client()
        .get(url(&format!("/api/product/{id}/")))
        .send()
        .await
        .unwrap();
    assert_eq!(json_body(resp).await["id"], id);

    let resp = client().get(url("/api/bonus-product/")).send().await.unwrap();
    assert_eq!(json_body(resp).await["is_digital"], true);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_session_lifecycle() {
    let (client, user) = signed_up_client().await;

    let me = json_body(client.get(url("/api/auth/me/")).send().await.unwrap()).await;
    assert_eq!(me["id"], user["id"]);
    assert_eq!(me["username"], user["username"]);

    let resp = client.post(url("/api/auth/logout/")).send().await.unwrap();
    assert_eq!(
        json_body(resp).await,
        json!({ "ok": true, "message": "Successfully logged out" })
    );

    let me = json_body(client.get(url("/api/auth/me/")).send().await.unwrap()).await;
    assert!(me["id"].is_null());

    let resp = client
        .post(url("/api/auth/login/"))
        .json(&json!({ "email": user["email"], "password": "correct horse battery" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(url("/api/auth/login/"))
        .json(&json!({ "username": user["username"], "password": "wrong password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["error"], "Invalid credentials");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_duplicate_username_rejected() {
    let (_, user) = signed_up_client().await;
    let resp = client()
        .post(url("/api/auth/signup/"))
        .json(&json!({ "username": user["username"], "password": "another password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"], "username already exists");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_cart_operations() {
    let (client, _) = signed_up_client().await;

    let cart = json_body(client.get(url("/api/cart/")).send().await.unwrap()).await;
    assert_eq!(cart["item_count"], 0);

    let resp = client
        .post(url("/api/cart/add_to_cart/"))
        .json(&json!({ "quantity": 2, "customization": "ADA", "print_position": "back" }))
        .send()
        .await
        .unwrap();
    let cart = json_body(resp).await;
    assert_eq!(cart["item_count"], 2);
    assert_eq!(cart["items"][0]["print_position"], "back");

    // Adding again increments the same line
    let resp = client
        .post(url("/api/cart/add_to_cart/"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    let cart = json_body(resp).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["quantity"], 3);
    assert_eq!(cart["items"][0]["customization"], "ADA");

    let resp = client
        .post(url("/api/cart/update_quantity/"))
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(json_body(resp).await["item_count"], 0);

    let resp = client
        .post(url("/api/cart/update_quantity/"))
        .json(&json!({ "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(resp).await["error"], "No items in cart");

    let resp = client
        .post(url("/api/bonus-cart/clear_cart/"))
        .send()
        .await
        .unwrap();
    assert_eq!(
        json_body(resp).await["message"],
        "Bonus cart cleared successfully"
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_order_from_carts() {
    let (client, _) = signed_up_client().await;

    client
        .post(url("/api/cart/add_to_cart/"))
        .json(&json!({ "quantity": 2 }))
        .send()
        .await
        .unwrap();
    client
        .post(url("/api/bonus-cart/add_to_cart/"))
        .json(&json!({ "quantity": 1 }))
        .send()
        .await
        .unwrap();

    let resp = client
        .post(url("/api/orders/"))
        .json(&shipping())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order = json_body(resp).await;
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    assert_eq!(order["status"], "pending");
    assert!(order.get("shirtigo_status").is_some());

    // Carts are consumed
    let cart = json_body(client.get(url("/api/cart/")).send().await.unwrap()).await;
    assert_eq!(cart["item_count"], 0);

    let orders = json_body(client.get(url("/api/orders/")).send().await.unwrap()).await;
    assert_eq!(orders[0]["id"], order["id"]);

    let id = order["id"].as_str().unwrap();
    let resp = client
        .patch(url(&format!("/api/orders/{id}/update_status/")))
        .json(&json!({ "status": "refunded" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"], "Invalid status");

    let resp = client
        .patch(url(&format!("/api/orders/{id}/update_status/")))
        .json(&json!({ "status": "shipped" }))
        .send()
        .await
        .unwrap();
    assert_eq!(json_body(resp).await["status"], "shipped");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_empty_carts_use_fallback_line() {
    let (client, _) = signed_up_client().await;

    let mut body = shipping();
    body["print_position"] = json!("front_and_back");
    body["personalization"] = json!("GRACE");
    let resp = client
        .post(url("/api/orders/"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order = json_body(resp).await;
    assert_eq!(order["items"][0]["quantity"], 1);
    assert_eq!(order["items"][0]["product_type"], "single");
    assert_eq!(order["print_positions"], "front_and_back");
    assert_eq!(order["personalizations"], "GRACE");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_orders_are_private() {
    let (alice, _) = signed_up_client().await;
    let (bob, _) = signed_up_client().await;

    let resp = alice
        .post(url("/api/orders/test_create/"))
        .json(&shipping())
        .send()
        .await
        .unwrap();
    let id = json_body(resp).await["id"].as_str().unwrap().to_string();

    let resp = bob
        .get(url(&format!("/api/orders/{id}/")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_contact_form() {
    let resp = client()
        .post(url("/api/contact/"))
        .json(&json!({
            "name": "Ada",
            "email": "ada@example.com",
            "message": "Do you ship to Canada?",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(json_body(resp).await["contact_id"].is_i64());
}
