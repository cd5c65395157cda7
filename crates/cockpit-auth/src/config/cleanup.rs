//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Token cleanup configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::bounded_span;
use crate::{AuthError, AuthResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Whether the background sweep runs
    pub enabled: bool,

    /// Hours between sweeps
    pub interval_hours: u64,

    /// Days a revoked token is kept after revocation
    pub retention_days: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_hours: crate::DEFAULT_CLEANUP_INTERVAL_HOURS,
            retention_days: crate::DEFAULT_REVOKED_TOKEN_RETENTION_DAYS,
        }
    }
}

impl CleanupConfig {
    /// Sweep period, clamped to the accepted range
    pub fn interval(&self) -> Duration {
        let hours = self
            .interval_hours
            .clamp(1, crate::MAX_CLEANUP_INTERVAL_HOURS);
        Duration::from_secs(hours * 60 * 60)
    }

    pub fn retention(&self) -> AuthResult<chrono::Duration> {
        let days = bounded_span(
            self.retention_days,
            crate::MAX_REVOKED_TOKEN_RETENTION_DAYS,
            "Revoked token retention (days)",
        )?;
        chrono::Duration::try_days(days)
            .ok_or_else(|| AuthError::configuration("Revoked token retention is out of range"))
    }

    pub fn validate(&self) -> AuthResult<()> {
        if self.enabled {
            bounded_span(
                self.interval_hours,
                crate::MAX_CLEANUP_INTERVAL_HOURS,
                "Cleanup interval (hours)",
            )?;
        }
        self.retention()?;
        Ok(())
    }
}
