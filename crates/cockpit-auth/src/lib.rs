//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Authorization core for the Cockpit productivity backend
//!
//! This crate decides who is calling and what they may do. It combines a
//! role / feature / action permission model with signed access and refresh
//! tokens whose lifecycle is tracked per token identifier (jti).
//!
//! # Components
//!
//! - **Registry**: reference data for roles, features, actions and the
//!   (feature, action) permission pairs, loaded from configuration at startup
//! - **Permission Resolver**: admins hold every registered pair, everybody
//!   else holds only explicit per-user grants
//! - **Token Service**: issues, validates, rotates, revokes and sweeps
//!   JWT access/refresh tokens
//! - **Authorization Guard**: composes the token service and the resolver
//!   into a single request-time check
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cockpit_auth::{guard::require, AuthConfig, AuthManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = AuthConfig::default();
//!     config.jwt.secret = "a-long-random-signing-secret".to_string();
//!
//!     let auth_manager = AuthManager::new(config).await?;
//!     let admin = auth_manager
//!         .create_user("admin@example.com", "Sup3rSecret", "Admin", None)
//!         .await?;
//!
//!     let tokens = auth_manager.login("admin@example.com", "Sup3rSecret").await?;
//!     let user = require("todo_items", "delete")
//!         .check(&auth_manager, Some(&tokens.access_token))
//!         .await?;
//!     assert_eq!(user.id, admin.id);
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! Token-layer failures (`InvalidToken`, `Expired`, `Revoked`) are internal
//! detail. The guard collapses them into `NotAuthenticated`, and a valid
//! identity lacking the required pair yields `NotAuthorized`:
//!
//! ```rust,ignore
//! match require("expenses", "create").check(&auth_manager, token).await {
//!     Ok(user) => { /* run the handler */ }
//!     Err(AuthError::NotAuthenticated(_)) => { /* 401 */ }
//!     Err(AuthError::NotAuthorized(_)) => { /* 403 */ }
//!     Err(_) => { /* 500 */ }
//! }
//! ```

pub mod auth;
pub mod clock;
pub mod config;
pub mod guard;
pub mod jwt;
pub mod middleware;
pub mod permissions;
pub mod registry;
pub mod tokens;
pub mod users;

// Re-export commonly used types
pub use auth::{AuthError, AuthManager, AuthResult, AuthStats};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AuthConfig;
pub use guard::{require, require_admin, PermissionRequirement};
pub use jwt::{JwtClaims, JwtManager, TokenType};
pub use middleware::{enforce, extract_token, AuthenticatedUser, GuardPolicy, RouteGuard};
pub use permissions::{PermissionKey, PermissionManager, PermissionResolver, PermissionStats};
pub use registry::{Action, Feature, Permission, Registry, Role};
pub use tokens::{
    CleanupReport, InMemoryTokenStore, TokenCleanupHandle, TokenCleanupTask, TokenPair,
    TokenRecord, TokenService, TokenStatistics, TokenStats, TokenStore, ValidatedToken,
};
pub use users::{User, UserManager, UserStats};

/// Authorization core version
pub const AUTH_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default access token lifetime in hours
pub const DEFAULT_ACCESS_TOKEN_EXPIRE_HOURS: u64 = 1;

/// Default refresh token lifetime in days
pub const DEFAULT_REFRESH_TOKEN_EXPIRE_DAYS: u64 = 7;

/// Default Argon2 time cost
pub const DEFAULT_PASSWORD_HASH_ROUNDS: u32 = 2;

/// Default Argon2 memory cost in KiB (19 MiB)
pub const DEFAULT_PASSWORD_HASH_MEMORY_KIB: u32 = 19 * 1024;

/// Default interval between token cleanup sweeps in hours
pub const DEFAULT_CLEANUP_INTERVAL_HOURS: u64 = 24;

/// Default retention for revoked tokens in days
pub const DEFAULT_REVOKED_TOKEN_RETENTION_DAYS: u64 = 30;

/// Longest accepted access token lifetime in hours (one year)
pub const MAX_ACCESS_TOKEN_EXPIRE_HOURS: u64 = 24 * 365;

/// Longest accepted refresh token lifetime in days
pub const MAX_REFRESH_TOKEN_EXPIRE_DAYS: u64 = 10 * 365;

/// Longest accepted interval between cleanup sweeps in hours
pub const MAX_CLEANUP_INTERVAL_HOURS: u64 = 24 * 365;

/// Longest accepted retention for revoked tokens in days
pub const MAX_REVOKED_TOKEN_RETENTION_DAYS: u64 = 10 * 365;

/// Initialize the authorization core
///
/// Validates the configuration and builds an [`AuthManager`] backed by the
/// in-memory token store and the system clock.
pub async fn init_auth_system(
    config: AuthConfig,
) -> Result<AuthManager, Box<dyn std::error::Error + Send + Sync>> {
    tracing::info!("Initializing authorization core v{}", AUTH_VERSION);

    let auth_manager = AuthManager::new(config).await?;

    tracing::info!("Authorization core initialization completed");
    Ok(auth_manager)
}

/// Shutdown the authorization core
///
/// Runs a final token sweep so terminal records do not outlive the process
/// longer than necessary.
pub async fn shutdown_auth_system(
    auth_manager: AuthManager,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing::info!("Shutting down authorization core");

    auth_manager.shutdown().await?;

    tracing::info!("Authorization core shutdown completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        let mut config = AuthConfig::default();
        config.jwt.secret = "test-secret-key-that-is-long-enough".to_string();
        config.users.password_hash_memory_kib = 64;
        config.users.password_hash_rounds = 1;
        config
    }

    #[tokio::test]
    async fn test_auth_system_initialization() {
        let result = init_auth_system(test_config()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_auth_system_rejects_empty_secret() {
        let mut config = test_config();
        config.jwt.secret = String::new();
        let result = init_auth_system(config).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_auth_system_shutdown() {
        let auth_manager = init_auth_system(test_config()).await.unwrap();
        let result = shutdown_auth_system(auth_manager).await;
        assert!(result.is_ok());
    }
}
