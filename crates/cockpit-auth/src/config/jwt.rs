//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! JWT configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::bounded_span;
use crate::{AuthError, AuthResult};

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// JWT secret key
    pub secret: String,

    /// Algorithm to use for JWT signing
    pub algorithm: JwtAlgorithm,

    /// JWT issuer
    pub issuer: String,

    /// JWT audience
    pub audience: String,

    /// Access token lifetime in hours
    pub access_token_expire_hours: u64,

    /// Refresh token lifetime in days
    pub refresh_token_expire_days: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "your-secret-key-change-in-production".to_string(),
            algorithm: JwtAlgorithm::HS256,
            issuer: "cockpit-api".to_string(),
            audience: "cockpit-users".to_string(),
            access_token_expire_hours: crate::DEFAULT_ACCESS_TOKEN_EXPIRE_HOURS,
            refresh_token_expire_days: crate::DEFAULT_REFRESH_TOKEN_EXPIRE_DAYS,
        }
    }
}

impl JwtConfig {
    /// Lifetime of an access token
    pub fn access_token_lifetime(&self) -> AuthResult<chrono::Duration> {
        let hours = bounded_span(
            self.access_token_expire_hours,
            crate::MAX_ACCESS_TOKEN_EXPIRE_HOURS,
            "Access token lifetime (hours)",
        )?;
        chrono::Duration::try_hours(hours)
            .ok_or_else(|| AuthError::configuration("Access token lifetime is out of range"))
    }

    /// Lifetime of a refresh token
    pub fn refresh_token_lifetime(&self) -> AuthResult<chrono::Duration> {
        let days = bounded_span(
            self.refresh_token_expire_days,
            crate::MAX_REFRESH_TOKEN_EXPIRE_DAYS,
            "Refresh token lifetime (days)",
        )?;
        chrono::Duration::try_days(days)
            .ok_or_else(|| AuthError::configuration("Refresh token lifetime is out of range"))
    }

    pub fn validate(&self) -> AuthResult<()> {
        if self.secret.is_empty() {
            return Err(AuthError::configuration("JWT secret cannot be empty"));
        }
        self.access_token_lifetime()?;
        self.refresh_token_lifetime()?;
        Ok(())
    }
}

/// JWT algorithm
///
/// Only the HMAC family is supported; the signing secret is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JwtAlgorithm {
    HS256,
    HS384,
    HS512,
}

impl JwtAlgorithm {
    pub fn as_jsonwebtoken(&self) -> jsonwebtoken::Algorithm {
        match self {
            JwtAlgorithm::HS256 => jsonwebtoken::Algorithm::HS256,
            JwtAlgorithm::HS384 => jsonwebtoken::Algorithm::HS384,
            JwtAlgorithm::HS512 => jsonwebtoken::Algorithm::HS512,
        }
    }
}

impl FromStr for JwtAlgorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HS256" => Ok(JwtAlgorithm::HS256),
            "HS384" => Ok(JwtAlgorithm::HS384),
            "HS512" => Ok(JwtAlgorithm::HS512),
            other => Err(AuthError::configuration(format!(
                "Unsupported JWT algorithm: {}",
                other
            ))),
        }
    }
}
