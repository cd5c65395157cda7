//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Token record and result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::jwt::{JwtClaims, TokenType};

/// Persisted state of one issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub jti: Uuid,

    pub user_id: Uuid,

    pub token_type: TokenType,

    pub expires_at: DateTime<Utc>,

    pub revoked: bool,

    /// Last successful validation, access tokens only
    pub last_used_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    /// Last state change; for revoked records this is the revocation time
    pub updated_at: DateTime<Utc>,
}

impl TokenRecord {
    pub fn new(
        jti: Uuid,
        user_id: Uuid,
        token_type: TokenType,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            jti,
            user_id,
            token_type,
            expires_at,
            revoked: false,
            last_used_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Neither revoked nor expired
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && !self.is_expired_at(now)
    }
}

/// Result of a revocation attempt on a single record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// This call flipped the flag; carries the record as it was before
    Revoked(TokenRecord),
    AlreadyRevoked,
    Expired,
    Missing,
}

/// Freshly issued access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,

    pub refresh_token: String,

    /// Always `bearer`
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// Refresh token lifetime in seconds
    pub refresh_expires_in: i64,
}

/// Outcome of a successful validation
#[derive(Debug, Clone)]
pub struct ValidatedToken {
    pub user_id: Uuid,
    pub jti: Uuid,
    pub claims: JwtClaims,
}

/// Tokens removed from the store, per type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RemovedTokens {
    pub access: usize,
    pub refresh: usize,
}

impl RemovedTokens {
    pub fn count(&mut self, token_type: TokenType) {
        match token_type {
            TokenType::Access => self.access += 1,
            TokenType::Refresh => self.refresh += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.access + self.refresh
    }
}

impl std::ops::Add for RemovedTokens {
    type Output = RemovedTokens;

    fn add(self, other: RemovedTokens) -> RemovedTokens {
        RemovedTokens {
            access: self.access + other.access,
            refresh: self.refresh + other.refresh,
        }
    }
}

/// Result of one cleanup sweep
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    pub expired: RemovedTokens,

    /// Revoked records past the retention window
    pub revoked: RemovedTokens,

    pub access_tokens_removed: usize,

    pub refresh_tokens_removed: usize,

    pub total_removed: usize,

    pub cleaned_at: DateTime<Utc>,
}

impl CleanupReport {
    pub fn new(expired: RemovedTokens, revoked: RemovedTokens, cleaned_at: DateTime<Utc>) -> Self {
        let removed = expired + revoked;
        Self {
            expired,
            revoked,
            access_tokens_removed: removed.access,
            refresh_tokens_removed: removed.refresh,
            total_removed: removed.total(),
            cleaned_at,
        }
    }
}

/// Record counts for one token type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenCounts {
    pub total: usize,
    pub active: usize,
    pub revoked: usize,
    /// Expired and not revoked
    pub expired: usize,
}

impl TokenCounts {
    pub fn record(&mut self, record: &TokenRecord, now: DateTime<Utc>) {
        self.total += 1;
        if record.revoked {
            self.revoked += 1;
        } else if record.is_expired_at(now) {
            self.expired += 1;
        } else {
            self.active += 1;
        }
    }
}

/// Snapshot of the token store
#[derive(Debug, Clone, Serialize)]
pub struct TokenStatistics {
    pub access_tokens: TokenCounts,
    pub refresh_tokens: TokenCounts,
    pub generated_at: DateTime<Utc>,
}
