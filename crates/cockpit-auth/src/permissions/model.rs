//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Permission model definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Name-level (feature, action) pair
///
/// Displayed and parsed as `feature:action`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionKey {
    pub feature: String,
    pub action: String,
}

impl PermissionKey {
    pub fn new(feature: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            action: action.into(),
        }
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.feature, self.action)
    }
}

impl FromStr for PermissionKey {
    type Err = crate::AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((feature, action)) if !feature.is_empty() && !action.is_empty() => {
                Ok(Self::new(feature, action))
            }
            _ => Err(crate::AuthError::validation(format!(
                "Expected feature:action, got '{}'",
                s
            ))),
        }
    }
}

/// Grant of one registered permission to one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermission {
    pub user_id: Uuid,

    pub permission_id: Uuid,

    pub granted_at: DateTime<Utc>,

    /// Administrator that issued the grant
    pub granted_by: Option<Uuid>,
}

impl UserPermission {
    pub fn new(user_id: Uuid, permission_id: Uuid, granted_by: Option<Uuid>) -> Self {
        Self {
            user_id,
            permission_id,
            granted_at: Utc::now(),
            granted_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_key_display() {
        let key = PermissionKey::new("todo_items", "read");
        assert_eq!(key.to_string(), "todo_items:read");
    }

    #[test]
    fn test_permission_key_parse() {
        let key: PermissionKey = "expenses:delete".parse().unwrap();
        assert_eq!(key, PermissionKey::new("expenses", "delete"));

        assert!("expenses".parse::<PermissionKey>().is_err());
        assert!(":read".parse::<PermissionKey>().is_err());
    }

    #[test]
    fn test_permission_key_ordering() {
        let mut keys = vec![
            PermissionKey::new("users", "read"),
            PermissionKey::new("expenses", "update"),
            PermissionKey::new("expenses", "create"),
        ];
        keys.sort();
        assert_eq!(keys[0].to_string(), "expenses:create");
        assert_eq!(keys[2].to_string(), "users:read");
    }
}
