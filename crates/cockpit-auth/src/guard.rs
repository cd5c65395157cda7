//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Request-time authorization checks
//!
//! A guard either yields the calling user or fails with exactly one of
//! `NotAuthenticated` or `NotAuthorized`. Why a token was rejected is logged
//! here and never returned.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::auth::{AuthError, AuthManager, AuthResult};
use crate::permissions::PermissionKey;
use crate::users::User;

/// A (feature, action) pair a caller must hold
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionRequirement {
    feature: String,
    action: String,
}

/// Build a reusable requirement for `action` on `feature`
pub fn require(feature: impl Into<String>, action: impl Into<String>) -> PermissionRequirement {
    PermissionRequirement {
        feature: feature.into(),
        action: action.into(),
    }
}

impl PermissionRequirement {
    pub fn feature(&self) -> &str {
        &self.feature
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn key(&self) -> PermissionKey {
        PermissionKey::new(self.feature.as_str(), self.action.as_str())
    }

    /// Check a request's access token against this requirement
    pub async fn check(&self, auth: &AuthManager, access_token: Option<&str>) -> AuthResult<User> {
        let user = authenticate(auth, access_token).await?;

        let allowed = auth
            .resolver()
            .has_permission(&user, &self.feature, &self.action)
            .await;
        auth.record_authorization(allowed).await;

        if allowed {
            Ok(user)
        } else {
            debug!(user_id = %user.id, requirement = %self, "Permission denied");
            Err(AuthError::not_authorized(format!(
                "Missing permission {}",
                self
            )))
        }
    }
}

impl fmt::Display for PermissionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.feature, self.action)
    }
}

/// Resolve a request's access token to an active user
pub async fn authenticate(auth: &AuthManager, access_token: Option<&str>) -> AuthResult<User> {
    let token = access_token
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::not_authenticated("Missing credentials"))?;

    auth.authenticate(token).await.map_err(|e| {
        if e.is_token_error() {
            warn!(reason = %e, "Rejected access token");
        }
        e.into_guard_error()
    })
}

/// Require a user in the admin role
pub async fn require_admin(auth: &AuthManager, access_token: Option<&str>) -> AuthResult<User> {
    let user = authenticate(auth, access_token).await?;
    let allowed = auth.resolver().is_admin(&user).await;
    auth.record_authorization(allowed).await;

    if allowed {
        Ok(user)
    } else {
        Err(AuthError::not_authorized("Admin role required"))
    }
}
