//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Token cookie configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cookie carrying the access token
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Cookie carrying the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Cookie domain, host-only when unset
    pub domain: Option<String>,

    /// Cookie path
    pub path: String,

    /// Only send over HTTPS
    pub secure: bool,

    /// Hide from scripts
    pub http_only: bool,

    /// SameSite policy
    pub same_site: SameSite,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            domain: None,
            path: "/".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
        }
    }
}

impl CookieConfig {
    /// Render a `Set-Cookie` header value
    pub fn build(&self, name: &str, value: &str, max_age_secs: u64) -> String {
        let mut cookie = format!(
            "{}={}; Max-Age={}; Path={}",
            name, value, max_age_secs, self.path
        );
        if let Some(domain) = &self.domain {
            cookie.push_str("; Domain=");
            cookie.push_str(domain);
        }
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=");
        cookie.push_str(&self.same_site.to_string());
        cookie
    }

    /// Render a `Set-Cookie` header value that expires the cookie
    pub fn clear(&self, name: &str) -> String {
        self.build(name, "", 0)
    }
}

/// SameSite cookie attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

impl FromStr for SameSite {
    type Err = crate::AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(SameSite::Strict),
            "lax" => Ok(SameSite::Lax),
            "none" => Ok(SameSite::None),
            other => Err(crate::AuthError::configuration(format!(
                "Unsupported SameSite policy: {}",
                other
            ))),
        }
    }
}
