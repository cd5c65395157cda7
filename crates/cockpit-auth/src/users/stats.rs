//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! User statistics

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Why a credential check failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginRejection {
    UnknownEmail,
    BadPassword,
    Inactive,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserStats {
    pub users_created: u64,
    pub users_deleted: u64,
    pub deactivations: u64,
    pub role_changes: u64,

    /// Credential checks that produced a user
    pub logins_accepted: u64,

    pub rejected_unknown_email: u64,
    pub rejected_bad_password: u64,

    /// Correct password on a deactivated account
    pub rejected_inactive: u64,

    pub last_user_created: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

impl UserStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_created(&mut self, at: DateTime<Utc>) {
        self.users_created += 1;
        self.last_user_created = Some(at);
    }

    pub fn record_deleted(&mut self) {
        self.users_deleted += 1;
    }

    pub fn record_active_change(&mut self, is_active: bool) {
        if !is_active {
            self.deactivations += 1;
        }
    }

    pub fn record_role_change(&mut self) {
        self.role_changes += 1;
    }

    pub fn record_login(&mut self, at: DateTime<Utc>) {
        self.logins_accepted += 1;
        self.last_login = Some(at);
    }

    pub fn record_rejection(&mut self, reason: LoginRejection) {
        match reason {
            LoginRejection::UnknownEmail => self.rejected_unknown_email += 1,
            LoginRejection::BadPassword => self.rejected_bad_password += 1,
            LoginRejection::Inactive => self.rejected_inactive += 1,
        }
    }

    /// All rejected credential checks
    pub fn logins_rejected(&self) -> u64 {
        self.rejected_unknown_email + self.rejected_bad_password + self.rejected_inactive
    }
}
