//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Token service statistics

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Token service statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct TokenStats {
    /// Number of token pairs issued
    pub pairs_issued: u64,

    /// Number of successful validations
    pub tokens_validated: u64,

    /// Number of failed validations
    pub validation_failures: u64,

    /// Number of successful refresh rotations
    pub tokens_refreshed: u64,

    /// Number of records flipped to revoked
    pub tokens_revoked: u64,

    /// Number of completed cleanup sweeps
    pub cleanup_runs: u64,

    /// Number of records removed by cleanup
    pub tokens_cleaned: u64,

    /// Last token pair issued
    pub last_pair_issued: Option<DateTime<Utc>>,

    /// Last cleanup sweep
    pub last_cleanup: Option<DateTime<Utc>>,
}

impl TokenStats {
    /// Create new token statistics
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_pairs_issued(&mut self, at: DateTime<Utc>) {
        self.pairs_issued += 1;
        self.last_pair_issued = Some(at);
    }

    pub fn record_validation(&mut self, success: bool) {
        if success {
            self.tokens_validated += 1;
        } else {
            self.validation_failures += 1;
        }
    }

    pub fn increment_tokens_refreshed(&mut self) {
        self.tokens_refreshed += 1;
    }

    pub fn add_tokens_revoked(&mut self, count: u64) {
        self.tokens_revoked += count;
    }

    pub fn record_cleanup(&mut self, removed: u64, at: DateTime<Utc>) {
        self.cleanup_runs += 1;
        self.tokens_cleaned += removed;
        self.last_cleanup = Some(at);
    }

    /// Get validation success rate
    pub fn validation_success_rate(&self) -> f64 {
        let total_validations = self.tokens_validated + self.validation_failures;
        if total_validations == 0 {
            0.0
        } else {
            self.tokens_validated as f64 / total_validations as f64
        }
    }
}
