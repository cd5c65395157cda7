//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Authorization configuration module

pub mod auth;
pub mod cleanup;
pub mod cookie;
pub mod jwt;
pub mod rbac;
pub mod registry;
pub mod user;

// Re-export commonly used types
pub use auth::AuthConfig;
pub use cleanup::CleanupConfig;
pub use cookie::{CookieConfig, SameSite, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
pub use jwt::{JwtAlgorithm, JwtConfig};
pub use rbac::RbacConfig;
pub use registry::{RegistryConfig, RegistryEntryConfig};
pub use user::{PasswordComplexity, UserConfig};

use crate::{AuthError, AuthResult};

/// Check a configured span against `1..=max` and convert it for chrono
pub(crate) fn bounded_span(value: u64, max: u64, what: &str) -> AuthResult<i64> {
    if value == 0 || value > max {
        return Err(AuthError::configuration(format!(
            "{} must be between 1 and {}, got {}",
            what, max, value
        )));
    }
    i64::try_from(value)
        .map_err(|_| AuthError::configuration(format!("{} is out of range", what)))
}
