//! Cwish marketing site server.
//!
//! Serves the static HTML frontend with clean URLs (`/cart` instead of
//! `/cart.html`). The JSON API lives in `cwish-storefront`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod rewrite;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{Router, middleware};
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Shared state: the directory being served.
#[derive(Clone)]
pub struct SiteState {
    root: Arc<PathBuf>,
}

impl SiteState {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Build the site router: every request is rewritten, then served from disk.
pub fn app(state: SiteState) -> Router {
    let files = ServeDir::new(state.root());

    Router::new()
        .fallback_service(files)
        .layer(middleware::from_fn_with_state(
            state,
            rewrite::rewrite_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}
