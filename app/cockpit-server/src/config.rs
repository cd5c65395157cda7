//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Server configuration
//!
//! Loaded from `AUTH_*` environment variables when `AUTH_JWT_SECRET` is set,
//! otherwise from the TOML file named by `COCKPIT_CONFIG`, otherwise from
//! defaults. The bootstrap admin can always be supplied through
//! `COCKPIT_ADMIN_EMAIL` and `COCKPIT_ADMIN_PASSWORD`.

use cockpit_auth::AuthConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};

/// Default listen address
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";

/// Default configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/cockpit.toml";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind_address: String,

    /// Origins allowed to make credentialed cross-origin requests
    pub cors_allowed_origins: Vec<String>,

    /// Authorization core configuration
    pub auth: AuthConfig,

    /// Admin account created at startup if missing
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            cors_allowed_origins: Vec::new(),
            auth: AuthConfig::default(),
            bootstrap_admin: None,
        }
    }
}

/// Initial admin credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("password", &"<sensitive>")
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> ApiResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str::<ServerConfig>(&content)?)
    }

    /// Load configuration from environment or file
    pub fn load() -> ApiResult<Self> {
        let mut config = if std::env::var("AUTH_JWT_SECRET").is_ok() {
            info!("Loading configuration from environment");
            ServerConfig {
                bind_address: std::env::var("COCKPIT_BIND_ADDRESS")
                    .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string()),
                auth: AuthConfig::from_env()?,
                ..Default::default()
            }
        } else {
            let config_path = std::env::var("COCKPIT_CONFIG")
                .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
            Self::from_file_or_default(&config_path)
        };

        if let (Ok(email), Ok(password)) = (
            std::env::var("COCKPIT_ADMIN_EMAIL"),
            std::env::var("COCKPIT_ADMIN_PASSWORD"),
        ) {
            config.bootstrap_admin = Some(BootstrapAdmin { email, password });
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file_or_default(path: &str) -> Self {
        if Path::new(path).exists() {
            match Self::from_file(path) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path);
                    return config;
                }
                Err(e) => warn!("Failed to load config file {}: {}", path, e),
            }
        }

        info!("Using default configuration");
        Self::default()
    }

    /// Validate the server configuration
    pub fn validate(&self) -> ApiResult<()> {
        self.bind_address
            .parse::<std::net::SocketAddr>()
            .map_err(|e| {
                ApiError::Configuration(format!(
                    "Invalid bind address '{}': {}",
                    self.bind_address, e
                ))
            })?;

        self.auth.validate()?;
        Ok(())
    }
}
