//! Site server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `SITE_ROOT` - Directory holding the HTML files (default: `.`)
//! - `SITE_HOST` - Bind address (default: 127.0.0.1)
//! - `SITE_PORT` - Listen port (default: 8080)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("SITE_ROOT {0} is not a directory")]
    NotADirectory(PathBuf),
}

/// Static site configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub root: PathBuf,
    pub host: IpAddr,
    pub port: u16,
}

impl SiteConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the host or port does not parse, or the root
    /// is not a directory.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Self::from_values(
            std::env::var("SITE_ROOT").ok(),
            std::env::var("SITE_HOST").ok(),
            std::env::var("SITE_PORT").ok(),
        )
    }

    /// Build the configuration from raw values, applying defaults.
    ///
    /// # Errors
    ///
    /// See [`SiteConfig::from_env`].
    pub fn from_values(
        root: Option<String>,
        host: Option<String>,
        port: Option<String>,
    ) -> Result<Self, ConfigError> {
        let root = PathBuf::from(root.unwrap_or_else(|| ".".to_string()));
        if !root.is_dir() {
            return Err(ConfigError::NotADirectory(root));
        }

        let host = host
            .as_deref()
            .unwrap_or("127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SITE_HOST".to_string(), e.to_string()))?;
        let port = port
            .as_deref()
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SITE_PORT".to_string(), e.to_string()))?;

        Ok(Self { root, host, port })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
