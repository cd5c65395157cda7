//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Role-based access control configuration

use serde::{Deserialize, Serialize};

/// Role-based access control configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RbacConfig {
    /// Role that bypasses grant checks
    pub admin_role: String,

    /// Role assigned when none is given
    pub default_role: String,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            admin_role: "Admin".to_string(),
            default_role: "User".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rbac_config_default() {
        let config = RbacConfig::default();
        assert_eq!(config.default_role, "User");
        assert_eq!(config.admin_role, "Admin");
    }
}
