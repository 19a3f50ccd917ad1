//! Clean-URL rewriting.
//!
//! Known pages have fixed targets; any other extensionless path is served
//! from `<path>.html` when that file exists. Paths are percent-decoded
//! before they are matched or looked up on disk.

use std::path::Path;

use percent_encoding::percent_decode_str;

use axum::{
    extract::{Request, State},
    http::Uri,
    middleware::Next,
    response::Response,
};

use crate::SiteState;

/// Clean paths with a fixed target file.
pub const PAGE_ROUTES: &[(&str, &str)] = &[
    ("/", "/home.html"),
    ("/home", "/home.html"),
    ("/nectar", "/nectar.html"),
    ("/contact", "/contact.html"),
    ("/login", "/login.html"),
    ("/signup", "/signup.html"),
    ("/account", "/my-account.html"),
    ("/cart", "/cart.html"),
    ("/test-cart", "/test-cart.html"),
];

/// What to do with a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// Serve this path instead.
    To(&'static str),
    /// Serve `<path>.html` if that file exists.
    HtmlIfExists(String),
    /// Serve the path as requested.
    Unchanged,
}

/// Decide how a request path is rewritten.
#[must_use]
pub fn plan(path: &str) -> Rewrite {
    if let Some((_, target)) = PAGE_ROUTES.iter().find(|(from, _)| *from == path) {
        return Rewrite::To(target);
    }
    if path.ends_with('/') || path.contains('.') {
        return Rewrite::Unchanged;
    }
    Rewrite::HtmlIfExists(format!("{path}.html"))
}

/// Resolve the path to serve, checking the filesystem under `root`.
///
/// `path` is the raw request path. The returned target stays
/// percent-encoded so it can be put back into the request URI.
pub async fn resolve(root: &Path, path: &str) -> Option<String> {
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    match plan(&decoded) {
        Rewrite::To(target) => Some(target.to_string()),
        Rewrite::HtmlIfExists(candidate) => {
            let file = root.join(candidate.trim_start_matches('/'));
            tokio::fs::metadata(&file)
                .await
                .is_ok_and(|meta| meta.is_file())
                .then(|| format!("{path}.html"))
        }
        Rewrite::Unchanged => None,
    }
}

/// Replace the path of a URI, keeping its query string.
#[must_use]
pub fn with_path(uri: &Uri, path: &str) -> Option<Uri> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };
    path_and_query.parse().ok()
}

/// Middleware rewriting clean URLs before the file service sees them.
pub async fn rewrite_middleware(
    State(state): State<SiteState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(target) = resolve(state.root(), request.uri().path()).await {
        if let Some(uri) = with_path(request.uri(), &target) {
            tracing::debug!(from = %request.uri().path(), to = %target, "Rewrote URL");
            *request.uri_mut() = uri;
        }
    }
    next.run(request).await
}
