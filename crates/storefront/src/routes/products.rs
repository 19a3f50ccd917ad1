//! Catalog route handlers.
//!
//! Both catalogs expose the same two endpoints; the handlers are generic
//! over the product kind.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::extract::PathParam;
use crate::services::catalog::CachedCatalog;
use crate::state::AppState;

/// `404` for a catalog without an active product.
pub(super) fn no_active<P: CachedCatalog>() -> AppError {
    AppError::NotFound(format!("No active {} available", P::LABEL))
}

/// The active product of the catalog.
///
/// GET /api/product, GET /api/bonus-product
#[instrument(skip(state), fields(kind = %P::KIND))]
pub async fn active<P: CachedCatalog>(State(state): State<AppState>) -> Result<Json<P>> {
    state
        .catalog()
        .active::<P>(state.pool())
        .await?
        .map(Json)
        .ok_or_else(no_active::<P>)
}

/// One product of the catalog, if it is active.
///
/// GET /api/product/{id}, GET /api/bonus-product/{id}
#[instrument(skip(state), fields(kind = %P::KIND))]
pub async fn by_id<P: CachedCatalog>(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<Json<P>> {
    state
        .catalog()
        .get_active::<P>(state.pool(), id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Not found.".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::models::{BonusProduct, Product};
    use crate::routes::test_support::{get, json_body, send};

    #[tokio::test]
    async fn test_non_numeric_id_is_not_found() {
        for uri in ["/api/product/abc/", "/api/bonus-product/1.5/"] {
            let response = send(get(uri)).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(json_body(response).await["error"], "Not found.");
        }
    }

    #[test]
    fn test_no_active_messages() {
        assert_eq!(
            no_active::<Product>().to_string(),
            "Not found: No active product available"
        );
        assert_eq!(
            no_active::<BonusProduct>().to_string(),
            "Not found: No active bonus product available"
        );
    }
}
