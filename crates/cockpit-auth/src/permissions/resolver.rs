//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Effective permission resolution
//!
//! A user in the admin role holds every registered (feature, action) pair,
//! computed from the registry on each call so that entries added at runtime
//! are visible immediately. Everybody else holds exactly their explicit
//! grants, joined against the registry at read time. Inactive users hold
//! nothing.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use crate::registry::Registry;
use crate::users::User;

use super::manager::PermissionManager;
use super::model::PermissionKey;

/// Permission resolver
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    registry: Arc<Registry>,
    grants: Arc<PermissionManager>,
    admin_role: String,
}

impl PermissionResolver {
    pub fn new(
        registry: Arc<Registry>,
        grants: Arc<PermissionManager>,
        admin_role: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            grants,
            admin_role: admin_role.into(),
        }
    }

    /// Whether the user's role is the admin role
    pub async fn is_admin(&self, user: &User) -> bool {
        self.registry
            .role_by_id(user.role_id)
            .await
            .is_some_and(|role| role.name == self.admin_role)
    }

    /// Every (feature, action) pair the user currently holds
    pub async fn effective_permissions(&self, user: &User) -> BTreeSet<PermissionKey> {
        if !user.is_active {
            return BTreeSet::new();
        }

        if self.is_admin(user).await {
            return self.registry.cross_product().await;
        }

        let granted = self.grants.granted_permission_ids(user.id).await;
        self.registry.resolve(granted.iter()).await
    }

    /// Whether the user may perform `action` on `feature`
    pub async fn has_permission(&self, user: &User, feature: &str, action: &str) -> bool {
        let allowed = self.evaluate(user, feature, action).await;
        self.grants.record_check(allowed).await;

        debug!(
            user_id = %user.id,
            feature,
            action,
            allowed,
            "Permission check"
        );
        allowed
    }

    async fn evaluate(&self, user: &User, feature: &str, action: &str) -> bool {
        if !user.is_active {
            return false;
        }

        if !self.registry.is_registered(feature, action).await {
            return false;
        }

        if self.is_admin(user).await {
            return true;
        }

        match self.registry.permission(feature, action).await {
            Some(permission) => self.grants.has_grant(user.id, permission.id).await,
            None => false,
        }
    }
}
