//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! JWT claims definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::users::User;
use crate::{AuthError, AuthResult};

/// Kind of token carried by a JWT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
        }
    }
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    /// User email at issue time
    pub email: String,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Issued at
    pub iat: i64,

    /// Expiration time
    pub exp: i64,

    /// JWT ID, the key of the token record
    pub jti: String,

    pub token_type: TokenType,
}

impl JwtClaims {
    /// Create claims for a subject, valid from `issued_at`
    pub fn new(
        user_id: Uuid,
        email: &str,
        token_type: TokenType,
        config: &JwtConfig,
        issued_at: DateTime<Utc>,
    ) -> AuthResult<Self> {
        let lifetime = match token_type {
            TokenType::Access => config.access_token_lifetime()?,
            TokenType::Refresh => config.refresh_token_lifetime()?,
        };
        let expires_at = issued_at.checked_add_signed(lifetime).ok_or_else(|| {
            AuthError::configuration(format!("{} token expiry is out of range", token_type))
        })?;

        Ok(Self {
            sub: user_id.to_string(),
            email: email.to_string(),
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type,
        })
    }

    /// Create claims for a user
    pub fn for_user(
        user: &User,
        token_type: TokenType,
        config: &JwtConfig,
        issued_at: DateTime<Utc>,
    ) -> AuthResult<Self> {
        Self::new(user.id, &user.email, token_type, config, issued_at)
    }

    /// Get user ID
    pub fn user_id(&self) -> AuthResult<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AuthError::invalid_token("Subject is not a user id"))
    }

    /// Get token ID
    pub fn token_id(&self) -> AuthResult<Uuid> {
        Uuid::parse_str(&self.jti).map_err(|_| AuthError::invalid_token("Malformed jti"))
    }

    /// Whether the token is expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Get expiration time as DateTime
    pub fn expiration_time(&self) -> AuthResult<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
            .ok_or_else(|| AuthError::invalid_token("Expiration out of range"))
    }

    /// Get issued at time as DateTime
    pub fn issued_at_time(&self) -> AuthResult<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
            .ok_or_else(|| AuthError::invalid_token("Issued-at out of range"))
    }
}
