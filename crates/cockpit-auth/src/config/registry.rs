//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Registry seed configuration

use serde::{Deserialize, Serialize};

/// Named registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntryConfig {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,
}

impl RegistryEntryConfig {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
        }
    }
}

/// Roles, features and actions loaded into the registry at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub roles: Vec<RegistryEntryConfig>,

    pub features: Vec<RegistryEntryConfig>,

    pub actions: Vec<RegistryEntryConfig>,

    /// Register every feature x action pair as a permission
    pub seed_all_permissions: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            roles: vec![
                RegistryEntryConfig::new("Admin", "Full access to every feature"),
                RegistryEntryConfig::new("User", "Access through explicit grants"),
                RegistryEntryConfig::new("TestUser", "Account used by automated tests"),
            ],
            features: vec![
                RegistryEntryConfig::new("categories", "Expense categories"),
                RegistryEntryConfig::new("expenses", "Expense tracking"),
                RegistryEntryConfig::new("payment_methods", "Payment methods"),
                RegistryEntryConfig::new("todo_items", "Todo items"),
                RegistryEntryConfig::new("roles", "Role administration"),
                RegistryEntryConfig::new("users", "User administration"),
            ],
            actions: vec![
                RegistryEntryConfig::new("create", "Create records"),
                RegistryEntryConfig::new("read", "Read records"),
                RegistryEntryConfig::new("update", "Update records"),
                RegistryEntryConfig::new("delete", "Delete records"),
            ],
            seed_all_permissions: true,
        }
    }
}

impl RegistryConfig {
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|role| role.name == name)
    }
}
