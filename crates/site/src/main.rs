//! Cwish site - static frontend with clean URLs.
//!
//! Serves `SITE_ROOT` on port 8080.

#![cfg_attr(not(test), forbid(unsafe_code))]

use cwish_site::config::SiteConfig;
use cwish_site::{SiteState, app};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cwish_site=info,tower_http=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SiteConfig::from_env()?;
    let addr = config.socket_addr();

    tracing::info!(root = %config.root.display(), "site listening on {}", addr);
    for (clean, file) in cwish_site::rewrite::PAGE_ROUTES {
        tracing::debug!("http://{addr}{clean} -> {file}");
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(SiteState::new(config.root)))
        .with_graceful_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutdown signal received"),
                Err(err) => {
                    tracing::error!(error = %err, "Failed to listen for Ctrl+C");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await?;

    Ok(())
}
