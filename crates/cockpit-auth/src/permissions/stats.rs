//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Permission statistics

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Permission statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct PermissionStats {
    /// Number of permission checks
    pub permission_checks: u64,

    /// Number of checks that allowed access
    pub permission_allowed: u64,

    /// Number of checks that denied access
    pub permission_denials: u64,

    /// Number of grants issued
    pub grants_issued: u64,

    /// Number of grants removed, including cascades
    pub grants_revoked: u64,

    /// Last permission check
    pub last_permission_check: Option<DateTime<Utc>>,
}

impl PermissionStats {
    /// Create new permission statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a permission check result
    pub fn record_permission_check(&mut self, allowed: bool) {
        self.permission_checks += 1;
        self.last_permission_check = Some(Utc::now());
        if allowed {
            self.permission_allowed += 1;
        } else {
            self.permission_denials += 1;
        }
    }

    pub fn record_grants_issued(&mut self, count: u64) {
        self.grants_issued += count;
    }

    pub fn record_grants_revoked(&mut self, count: u64) {
        self.grants_revoked += count;
    }

    /// Share of checks that allowed access
    pub fn allow_rate(&self) -> f64 {
        if self.permission_checks == 0 {
            0.0
        } else {
            self.permission_allowed as f64 / self.permission_checks as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_stats_record_check() {
        let mut stats = PermissionStats::new();

        stats.record_permission_check(true);
        assert_eq!(stats.permission_checks, 1);
        assert_eq!(stats.permission_allowed, 1);
        assert_eq!(stats.permission_denials, 0);
        assert!(stats.last_permission_check.is_some());

        stats.record_permission_check(false);
        assert_eq!(stats.permission_checks, 2);
        assert_eq!(stats.permission_denials, 1);
    }

    #[test]
    fn test_permission_stats_allow_rate() {
        let mut stats = PermissionStats::new();
        assert_eq!(stats.allow_rate(), 0.0);

        stats.record_permission_check(true);
        stats.record_permission_check(true);
        stats.record_permission_check(false);
        assert_eq!(stats.allow_rate(), 2.0 / 3.0);
    }
}
