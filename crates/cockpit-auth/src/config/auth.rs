//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Main authorization configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::cleanup::CleanupConfig;
use super::cookie::{CookieConfig, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use super::jwt::JwtConfig;
use super::rbac::RbacConfig;
use super::registry::RegistryConfig;
use super::user::UserConfig;
use crate::{AuthError, AuthResult};

/// Authorization configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,

    /// User management configuration
    pub users: UserConfig,

    /// Role-based access control configuration
    pub rbac: RbacConfig,

    /// Registry seed data
    pub registry: RegistryConfig,

    /// Token cleanup schedule
    pub cleanup: CleanupConfig,

    /// Token cookie attributes
    pub cookies: CookieConfig,
}

impl AuthConfig {
    /// Validate the authorization configuration
    pub fn validate(&self) -> AuthResult<()> {
        self.jwt.validate()?;
        self.cleanup.validate()?;
        self.users.validate()?;

        if !self.registry.has_role(&self.rbac.admin_role) {
            return Err(AuthError::configuration(format!(
                "Admin role '{}' is not registered",
                self.rbac.admin_role
            )));
        }

        if !self.registry.has_role(&self.rbac.default_role) {
            return Err(AuthError::configuration(format!(
                "Default role '{}' is not registered",
                self.rbac.default_role
            )));
        }

        Ok(())
    }

    /// `Set-Cookie` value for an access token, expiring with the token
    pub fn access_token_cookie(&self, token: &str) -> String {
        self.cookies.build(
            ACCESS_TOKEN_COOKIE,
            token,
            self.jwt.access_token_expire_hours.saturating_mul(60 * 60),
        )
    }

    /// `Set-Cookie` value for a refresh token, expiring with the token
    pub fn refresh_token_cookie(&self, token: &str) -> String {
        self.cookies.build(
            REFRESH_TOKEN_COOKIE,
            token,
            self.jwt.refresh_token_expire_days.saturating_mul(24 * 60 * 60),
        )
    }

    /// Create configuration from environment variables
    ///
    /// Reads configuration values from environment variables on top of the
    /// defaults. Variables are prefixed with `AUTH_` to avoid conflicts.
    ///
    /// # Environment Variables
    ///
    /// ## JWT Configuration
    /// - `AUTH_JWT_SECRET`: JWT secret key (required)
    /// - `AUTH_JWT_ALGORITHM`: HS256, HS384 or HS512 (default: HS256)
    /// - `AUTH_JWT_ISSUER`: JWT issuer (default: "cockpit-api")
    /// - `AUTH_JWT_AUDIENCE`: JWT audience (default: "cockpit-users")
    /// - `AUTH_JWT_ACCESS_TOKEN_EXPIRE_HOURS`: access token lifetime (default: 1)
    /// - `AUTH_JWT_REFRESH_TOKEN_EXPIRE_DAYS`: refresh token lifetime (default: 7)
    ///
    /// ## User Configuration
    /// - `AUTH_USERS_MIN_PASSWORD_LENGTH`: Minimum password length (default: 8)
    /// - `AUTH_USERS_PASSWORD_HASH_ROUNDS`: Argon2 time cost (default: 2)
    /// - `AUTH_USERS_PASSWORD_HASH_MEMORY_KIB`: Argon2 memory cost (default: 19456)
    ///
    /// ## RBAC Configuration
    /// - `AUTH_RBAC_ADMIN_ROLE`: Admin role (default: "Admin")
    /// - `AUTH_RBAC_DEFAULT_ROLE`: Default role (default: "User")
    ///
    /// ## Cleanup Configuration
    /// - `AUTH_CLEANUP_ENABLED`: Run the background sweep (default: true)
    /// - `AUTH_CLEANUP_INTERVAL_HOURS`: Hours between sweeps (default: 24)
    /// - `AUTH_CLEANUP_RETENTION_DAYS`: Revoked token retention (default: 30)
    ///
    /// ## Cookie Configuration
    /// - `AUTH_COOKIES_DOMAIN`: Cookie domain (default: unset)
    /// - `AUTH_COOKIES_SECURE`: Secure attribute (default: true)
    /// - `AUTH_COOKIES_HTTP_ONLY`: HttpOnly attribute (default: true)
    /// - `AUTH_COOKIES_SAME_SITE`: strict, lax or none (default: lax)
    ///
    /// # Example
    ///
    /// ```bash
    /// export AUTH_JWT_SECRET="your-super-secret-key"
    /// export AUTH_JWT_ACCESS_TOKEN_EXPIRE_HOURS="2"
    /// export AUTH_CLEANUP_RETENTION_DAYS="14"
    /// ```
    pub fn from_env() -> AuthResult<Self> {
        let mut config = Self::default();

        // JWT Configuration
        config.jwt.secret = std::env::var("AUTH_JWT_SECRET").map_err(|_| {
            AuthError::configuration("AUTH_JWT_SECRET environment variable is required")
        })?;

        if let Some(algorithm) = env_parse("AUTH_JWT_ALGORITHM")? {
            config.jwt.algorithm = algorithm;
        }

        if let Ok(issuer) = std::env::var("AUTH_JWT_ISSUER") {
            config.jwt.issuer = issuer;
        }

        if let Ok(audience) = std::env::var("AUTH_JWT_AUDIENCE") {
            config.jwt.audience = audience;
        }

        if let Some(hours) = env_parse("AUTH_JWT_ACCESS_TOKEN_EXPIRE_HOURS")? {
            config.jwt.access_token_expire_hours = hours;
        }

        if let Some(days) = env_parse("AUTH_JWT_REFRESH_TOKEN_EXPIRE_DAYS")? {
            config.jwt.refresh_token_expire_days = days;
        }

        // User Configuration
        if let Some(length) = env_parse("AUTH_USERS_MIN_PASSWORD_LENGTH")? {
            config.users.min_password_length = length;
        }

        if let Some(rounds) = env_parse("AUTH_USERS_PASSWORD_HASH_ROUNDS")? {
            config.users.password_hash_rounds = rounds;
        }

        if let Some(memory) = env_parse("AUTH_USERS_PASSWORD_HASH_MEMORY_KIB")? {
            config.users.password_hash_memory_kib = memory;
        }

        // RBAC Configuration
        if let Ok(admin_role) = std::env::var("AUTH_RBAC_ADMIN_ROLE") {
            config.rbac.admin_role = admin_role;
        }

        if let Ok(default_role) = std::env::var("AUTH_RBAC_DEFAULT_ROLE") {
            config.rbac.default_role = default_role;
        }

        // Cleanup Configuration
        if let Some(enabled) = env_parse("AUTH_CLEANUP_ENABLED")? {
            config.cleanup.enabled = enabled;
        }

        if let Some(hours) = env_parse("AUTH_CLEANUP_INTERVAL_HOURS")? {
            config.cleanup.interval_hours = hours;
        }

        if let Some(days) = env_parse("AUTH_CLEANUP_RETENTION_DAYS")? {
            config.cleanup.retention_days = days;
        }

        // Cookie Configuration
        if let Ok(domain) = std::env::var("AUTH_COOKIES_DOMAIN") {
            config.cookies.domain = Some(domain).filter(|d| !d.is_empty());
        }

        if let Some(secure) = env_parse("AUTH_COOKIES_SECURE")? {
            config.cookies.secure = secure;
        }

        if let Some(http_only) = env_parse("AUTH_COOKIES_HTTP_ONLY")? {
            config.cookies.http_only = http_only;
        }

        if let Some(same_site) = env_parse("AUTH_COOKIES_SAME_SITE")? {
            config.cookies.same_site = same_site;
        }

        // Validate the configuration
        config.validate()?;

        Ok(config)
    }
}

fn env_parse<T>(name: &str) -> AuthResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| AuthError::configuration(format!("{} is invalid: {}", name, e))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_config_default() {
        let config = AuthConfig::default();
        assert!(!config.jwt.secret.is_empty());
        assert_eq!(config.jwt.access_token_expire_hours, 1);
        assert_eq!(config.rbac.admin_role, "Admin");
        assert!(config.cleanup.enabled);
        assert!(config.cookies.http_only);
    }

    #[test]
    fn test_auth_config_validation() {
        let mut config = AuthConfig::default();
        assert!(config.validate().is_ok());

        config.jwt.secret = "".to_string();
        assert!(config.validate().is_err());

        config.jwt.secret = "test-secret".to_string();
        config.jwt.access_token_expire_hours = 0;
        assert!(config.validate().is_err());

        config.jwt.access_token_expire_hours = 1;
        config.rbac.admin_role = "Root".to_string();
        assert!(matches!(
            config.validate(),
            Err(AuthError::Configuration(_))
        ));
    }

    #[test]
    fn test_auth_config_partial_document() {
        let config: AuthConfig = serde_json::from_str(
            r#"{"jwt": {"secret": "from-file", "access_token_expire_hours": 4}}"#,
        )
        .unwrap();
        assert_eq!(config.jwt.secret, "from-file");
        assert_eq!(config.jwt.access_token_expire_hours, 4);
        assert_eq!(config.jwt.refresh_token_expire_days, 7);
        assert_eq!(config.registry.features.len(), 6);
    }

    #[test]
    fn test_validate_rejects_unrepresentable_lifetimes() {
        let mut config = AuthConfig::default();
        config.jwt.access_token_expire_hours = 1 << 63;
        assert!(matches!(
            config.validate(),
            Err(AuthError::Configuration(_))
        ));

        let mut config = AuthConfig::default();
        config.jwt.refresh_token_expire_days = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = AuthConfig::default();
        config.cleanup.retention_days = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = AuthConfig::default();
        config.jwt.access_token_expire_hours = u64::MAX;
        assert!(config
            .access_token_cookie("a")
            .starts_with(&format!("access_token=a; Max-Age={};", u64::MAX)));
    }

    #[test]
    fn test_token_cookies_follow_lifetimes() {
        let config = AuthConfig::default();
        assert!(config
            .access_token_cookie("a")
            .starts_with("access_token=a; Max-Age=3600;"));
        assert!(config
            .refresh_token_cookie("r")
            .starts_with("refresh_token=r; Max-Age=604800;"));
    }

    #[test]
    fn test_auth_config_from_env() {
        std::env::set_var("AUTH_JWT_SECRET", "test-secret-from-env");
        std::env::set_var("AUTH_CLEANUP_RETENTION_DAYS", "14");
        std::env::set_var("AUTH_COOKIES_SAME_SITE", "strict");

        let config = AuthConfig::from_env();

        std::env::remove_var("AUTH_JWT_SECRET");
        std::env::remove_var("AUTH_CLEANUP_RETENTION_DAYS");
        std::env::remove_var("AUTH_COOKIES_SAME_SITE");

        let config = config.unwrap();
        assert_eq!(config.jwt.secret, "test-secret-from-env");
        assert_eq!(config.cleanup.retention_days, 14);
        assert_eq!(config.cookies.same_site, crate::config::SameSite::Strict);
    }
}
