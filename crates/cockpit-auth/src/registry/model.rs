//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Registry model definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permissions::PermissionKey;

/// Role structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role ID
    pub id: Uuid,

    /// Unique role name
    pub name: String,

    /// Role description
    pub description: Option<String>,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Create new role
    pub fn new(name: String, description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            created_at: Utc::now(),
        }
    }
}

/// Protected area of the application, e.g. `todo_items`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Feature {
    pub fn new(name: String, description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            created_at: Utc::now(),
        }
    }
}

/// Verb performed on a feature, e.g. `read`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Action {
    pub fn new(name: String, description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            created_at: Utc::now(),
        }
    }
}

/// Registered (feature, action) pair
///
/// Names are carried alongside the ids; registry entries are never renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Permission ID
    pub id: Uuid,

    pub feature_id: Uuid,

    pub action_id: Uuid,

    pub feature: String,

    pub action: String,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Permission {
    /// Create new permission for a feature and action
    pub fn new(feature: &Feature, action: &Action) -> Self {
        Self {
            id: Uuid::new_v4(),
            feature_id: feature.id,
            action_id: action.id,
            feature: feature.name.clone(),
            action: action.name.clone(),
            created_at: Utc::now(),
        }
    }

    /// Name-level key of this permission
    pub fn key(&self) -> PermissionKey {
        PermissionKey::new(self.feature.clone(), self.action.clone())
    }
}
