//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! Every path is also served with a trailing slash.
//!
//! ```text
//! GET  /health                               - Liveness check
//! GET  /health/ready                         - Readiness check (database)
//!
//! # Catalog (public)
//! GET  /api/product                          - Active hero product
//! GET  /api/product/{id}                     - Hero product by id (if active)
//! GET  /api/bonus-product                    - Active bonus product
//! GET  /api/bonus-product/{id}               - Bonus product by id (if active)
//!
//! # Carts (authenticated; {cart} is `cart` or `bonus-cart`)
//! GET  /api/{cart}                           - Cart contents and totals
//! POST /api/{cart}/add_to_cart               - Add the active product
//! POST /api/{cart}/update_quantity           - Set quantity (0 removes)
//! POST /api/{cart}/clear_cart                - Empty the cart
//!
//! # Orders (authenticated)
//! GET   /api/orders                          - Caller's orders, newest first
//! POST  /api/orders                          - Place an order from the carts
//! POST  /api/orders/test_create              - Place a one-line hero order
//! GET   /api/orders/{id}                     - One order
//! PATCH /api/orders/{id}/update_status       - Change the status
//!
//! # Contact (public)
//! POST /api/contact                          - Contact form submission
//!
//! # Auth (signup and login are rate limited per client IP)
//! POST /api/auth/signup                      - Create an account and log in
//! POST /api/auth/login                       - Log in by username or email
//! POST /api/auth/logout                      - Log out
//! GET  /api/auth/me                          - Current user, or `{"id": null}`
//! ```

pub mod auth;
pub mod carts;
pub mod contact;
pub mod health;
pub mod orders;
pub mod products;

use axum::{
    Router,
    http::{HeaderValue, Method, Request, header},
    middleware as axum_middleware,
    routing::{get, patch, post},
};
use tower::Layer;
use tower_http::{
    cors::CorsLayer,
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::TraceLayer,
};

use crate::middleware::{auth_rate_limiter, create_session_layer, request_id_middleware};
use crate::models::{BonusProduct, Product};
use crate::services::catalog::CachedCatalog;
use crate::state::AppState;

/// Build the catalog routes for one product kind.
fn catalog_routes<P: CachedCatalog>() -> Router<AppState> {
    Router::new()
        .route("/", get(products::active::<P>))
        .route("/{id}", get(products::by_id::<P>))
}

/// Build the cart routes for one product kind.
fn cart_routes<P: CachedCatalog>() -> Router<AppState> {
    Router::new()
        .route("/", get(carts::list::<P>))
        .route("/add_to_cart", post(carts::add_to_cart::<P>))
        .route("/update_quantity", post(carts::update_quantity::<P>))
        .route("/clear_cart", post(carts::clear_cart::<P>))
}

/// Build the order routes.
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::create))
        .route("/test_create", post(orders::test_create))
        .route("/{id}", get(orders::show))
        .route("/{id}/update_status", patch(orders::update_status))
}

/// Build the auth routes.
///
/// Only the credential endpoints are rate limited; the frontend polls `/me`
/// on every page load.
fn auth_routes() -> Router<AppState> {
    let credentials = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .merge(credentials)
}

/// Build the `/api` routes.
fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/product", catalog_routes::<Product>())
        .nest("/bonus-product", catalog_routes::<BonusProduct>())
        .nest("/cart", cart_routes::<Product>())
        .nest("/bonus-cart", cart_routes::<BonusProduct>())
        .nest("/orders", order_routes())
        .route("/contact", post(contact::submit))
        .nest("/auth", auth_routes())
}

/// Build all routes, without middleware or state.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
}

/// CORS for the marketing site, which calls the API with its session cookie.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

/// The complete application: routes, middleware and state.
///
/// Trailing slashes are trimmed before routing, so the result must be
/// served as a whole (see `main.rs`).
pub fn app(state: AppState) -> NormalizePath<Router> {
    let session_layer = create_session_layer(state.pool(), state.config());
    let cors = cors_layer(&state.config().allowed_origins);

    let router = routes()
        .layer(session_layer)
        .layer(cors)
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, Response};
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::app;
    use crate::config::StorefrontConfig;
    use crate::state::AppState;

    /// State backed by a pool that never connects unless a query runs.
    pub fn state() -> AppState {
        let config = StorefrontConfig::for_tests();
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/cwish_test")
            .unwrap();
        AppState::new(config, pool).unwrap()
    }

    pub async fn send(request: Request<Body>) -> Response<Body> {
        app(state()).oneshot(request).await.unwrap()
    }

    pub fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::empty())
            .unwrap()
    }

    pub async fn json_body(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
