//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Per-user permission grant store

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::{AuthError, AuthResult};

use super::model::UserPermission;
use super::stats::PermissionStats;

/// Permission manager
///
/// Stores explicit grants keyed by user and permission id. Whether a
/// permission id is still registered is the resolver's concern.
#[derive(Debug)]
pub struct PermissionManager {
    /// user id -> permission id -> grant
    grants: Arc<RwLock<HashMap<Uuid, HashMap<Uuid, UserPermission>>>>,

    /// Statistics
    stats: Arc<RwLock<PermissionStats>>,
}

impl PermissionManager {
    /// Create new permission manager
    pub async fn new() -> AuthResult<Self> {
        Ok(Self {
            grants: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(RwLock::new(PermissionStats::default())),
        })
    }

    /// Grant a single permission
    pub async fn grant(
        &self,
        user_id: Uuid,
        permission_id: Uuid,
        granted_by: Option<Uuid>,
    ) -> AuthResult<UserPermission> {
        let mut granted = self
            .grant_many(user_id, &[permission_id], granted_by)
            .await?;
        granted
            .pop()
            .ok_or_else(|| AuthError::internal("Grant produced no assignment"))
    }

    /// Grant several permissions at once
    ///
    /// All or nothing: if any permission is already granted to the user the
    /// whole call fails with `Conflict` and nothing is stored.
    pub async fn grant_many(
        &self,
        user_id: Uuid,
        permission_ids: &[Uuid],
        granted_by: Option<Uuid>,
    ) -> AuthResult<Vec<UserPermission>> {
        let granted = {
            let mut grants = self.grants.write().await;
            let existing = grants.get(&user_id);

            let mut requested = std::collections::HashSet::new();
            for permission_id in permission_ids {
                let held = existing.is_some_and(|held| held.contains_key(permission_id));
                if held || !requested.insert(*permission_id) {
                    return Err(AuthError::conflict(format!(
                        "Permission {} already granted to user {}",
                        permission_id, user_id
                    )));
                }
            }
            if permission_ids.is_empty() {
                return Ok(Vec::new());
            }

            let user_grants = grants.entry(user_id).or_default();
            permission_ids
                .iter()
                .map(|permission_id| {
                    let grant = UserPermission::new(user_id, *permission_id, granted_by);
                    user_grants.insert(*permission_id, grant.clone());
                    grant
                })
                .collect::<Vec<_>>()
        };

        self.stats
            .write()
            .await
            .record_grants_issued(granted.len() as u64);

        info!("Granted {} permissions to user {}", granted.len(), user_id);
        Ok(granted)
    }

    /// Revoke a grant, returning whether one existed
    pub async fn revoke(&self, user_id: Uuid, permission_id: Uuid) -> bool {
        let removed = {
            let mut grants = self.grants.write().await;
            let removed = grants
                .get_mut(&user_id)
                .and_then(|user_grants| user_grants.remove(&permission_id))
                .is_some();
            if grants.get(&user_id).is_some_and(HashMap::is_empty) {
                grants.remove(&user_id);
            }
            removed
        };

        if removed {
            self.stats.write().await.record_grants_revoked(1);
            info!("Revoked permission {} from user {}", permission_id, user_id);
        }
        removed
    }

    /// Grants held by a user, oldest first
    pub async fn user_grants(&self, user_id: Uuid) -> Vec<UserPermission> {
        let grants = self.grants.read().await;
        let mut user_grants: Vec<UserPermission> = grants
            .get(&user_id)
            .map(|user_grants| user_grants.values().cloned().collect())
            .unwrap_or_default();
        user_grants.sort_by_key(|grant| grant.granted_at);
        user_grants
    }

    /// Permission ids granted to a user
    pub async fn granted_permission_ids(&self, user_id: Uuid) -> Vec<Uuid> {
        let grants = self.grants.read().await;
        grants
            .get(&user_id)
            .map(|user_grants| user_grants.keys().copied().collect())
            .unwrap_or_default()
    }

    pub async fn has_grant(&self, user_id: Uuid, permission_id: Uuid) -> bool {
        let grants = self.grants.read().await;
        grants
            .get(&user_id)
            .is_some_and(|user_grants| user_grants.contains_key(&permission_id))
    }

    /// Drop every grant of a user
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> usize {
        let removed = self
            .grants
            .write()
            .await
            .remove(&user_id)
            .map(|user_grants| user_grants.len())
            .unwrap_or(0);

        if removed > 0 {
            self.stats.write().await.record_grants_revoked(removed as u64);
            info!("Revoked {} permissions from user {}", removed, user_id);
        }
        removed
    }

    /// Drop every grant of a permission that left the registry
    pub async fn purge_permission(&self, permission_id: Uuid) -> usize {
        let removed = {
            let mut grants = self.grants.write().await;
            let mut removed = 0;
            for user_grants in grants.values_mut() {
                if user_grants.remove(&permission_id).is_some() {
                    removed += 1;
                }
            }
            grants.retain(|_, user_grants| !user_grants.is_empty());
            removed
        };

        if removed > 0 {
            self.stats.write().await.record_grants_revoked(removed as u64);
            info!(
                "Purged {} grants of removed permission {}",
                removed, permission_id
            );
        }
        removed
    }

    /// Record the outcome of a permission check
    pub async fn record_check(&self, allowed: bool) {
        self.stats.write().await.record_permission_check(allowed);
    }

    /// Get permission statistics
    pub async fn get_stats(&self) -> PermissionStats {
        let stats = self.stats.read().await;
        stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_grant_and_revoke() {
        let permission_manager = PermissionManager::new().await.unwrap();
        let user_id = Uuid::new_v4();
        let permission_id = Uuid::new_v4();

        let grant = permission_manager
            .grant(user_id, permission_id, None)
            .await
            .unwrap();
        assert_eq!(grant.user_id, user_id);
        assert!(permission_manager.has_grant(user_id, permission_id).await);

        assert!(permission_manager.revoke(user_id, permission_id).await);
        assert!(!permission_manager.revoke(user_id, permission_id).await);
        assert!(permission_manager.user_grants(user_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_grant_conflicts() {
        let permission_manager = PermissionManager::new().await.unwrap();
        let user_id = Uuid::new_v4();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        permission_manager.grant(user_id, first, None).await.unwrap();

        let result = permission_manager
            .grant_many(user_id, &[second, first], None)
            .await;
        assert!(matches!(result, Err(AuthError::Conflict(_))));

        // Nothing from the failed batch was stored
        assert!(!permission_manager.has_grant(user_id, second).await);
        assert_eq!(permission_manager.user_grants(user_id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_batch_leaves_no_user_entry() {
        let permission_manager = PermissionManager::new().await.unwrap();
        let user_id = Uuid::new_v4();
        let permission_id = Uuid::new_v4();

        let result = permission_manager
            .grant_many(user_id, &[permission_id, permission_id], None)
            .await;
        assert!(matches!(result, Err(AuthError::Conflict(_))));
        assert!(permission_manager
            .grant_many(user_id, &[], None)
            .await
            .unwrap()
            .is_empty());

        assert!(!permission_manager.grants.read().await.contains_key(&user_id));
        assert_eq!(permission_manager.get_stats().await.grants_issued, 0);
    }

    #[tokio::test]
    async fn test_purge_permission() {
        let permission_manager = PermissionManager::new().await.unwrap();
        let permission_id = Uuid::new_v4();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        permission_manager.grant(alice, permission_id, None).await.unwrap();
        permission_manager.grant(bob, permission_id, None).await.unwrap();
        permission_manager
            .grant(bob, Uuid::new_v4(), None)
            .await
            .unwrap();

        assert_eq!(permission_manager.purge_permission(permission_id).await, 2);
        assert!(permission_manager.granted_permission_ids(alice).await.is_empty());
        assert_eq!(permission_manager.granted_permission_ids(bob).await.len(), 1);
    }

    #[tokio::test]
    async fn test_revoke_all_for_user() {
        let permission_manager = PermissionManager::new().await.unwrap();
        let user_id = Uuid::new_v4();
        permission_manager
            .grant_many(user_id, &[Uuid::new_v4(), Uuid::new_v4()], None)
            .await
            .unwrap();

        assert_eq!(permission_manager.revoke_all_for_user(user_id).await, 2);
        assert_eq!(permission_manager.revoke_all_for_user(user_id).await, 0);

        let stats = permission_manager.get_stats().await;
        assert_eq!(stats.grants_issued, 2);
        assert_eq!(stats.grants_revoked, 2);
    }
}
