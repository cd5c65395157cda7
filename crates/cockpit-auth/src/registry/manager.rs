//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Registry of roles, features, actions and permissions
//!
//! The registry is reference data. It is seeded from [`RegistryConfig`] at
//! startup and shared as an `Arc<Registry>`; there is no global table.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::config::RegistryConfig;
use crate::permissions::PermissionKey;
use crate::{AuthError, AuthResult};

use super::model::{Action, Feature, Permission, Role};
use super::stats::RegistryStats;

#[derive(Debug, Default)]
struct RegistryState {
    roles: HashMap<Uuid, Role>,
    role_names: HashMap<String, Uuid>,
    features: BTreeMap<String, Feature>,
    actions: BTreeMap<String, Action>,
    permissions: HashMap<Uuid, Permission>,
    /// (feature_id, action_id) -> permission id
    permission_index: HashMap<(Uuid, Uuid), Uuid>,
    last_modified: Option<DateTime<Utc>>,
}

fn normalize_name(kind: &str, name: &str) -> AuthResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::validation(format!("{} name cannot be empty", kind)));
    }
    Ok(name.to_string())
}

impl RegistryState {
    fn touch(&mut self) {
        self.last_modified = Some(Utc::now());
    }

    fn add_role(&mut self, name: &str, description: Option<String>) -> AuthResult<Role> {
        let name = normalize_name("Role", name)?;
        if self.role_names.contains_key(&name) {
            return Err(AuthError::conflict(format!("Role '{}' already exists", name)));
        }

        let role = Role::new(name, description);
        self.role_names.insert(role.name.clone(), role.id);
        self.roles.insert(role.id, role.clone());
        self.touch();
        Ok(role)
    }

    fn add_feature(&mut self, name: &str, description: Option<String>) -> AuthResult<Feature> {
        let name = normalize_name("Feature", name)?;
        if self.features.contains_key(&name) {
            return Err(AuthError::conflict(format!("Feature '{}' already exists", name)));
        }

        let feature = Feature::new(name, description);
        self.features.insert(feature.name.clone(), feature.clone());
        self.touch();
        Ok(feature)
    }

    fn add_action(&mut self, name: &str, description: Option<String>) -> AuthResult<Action> {
        let name = normalize_name("Action", name)?;
        if self.actions.contains_key(&name) {
            return Err(AuthError::conflict(format!("Action '{}' already exists", name)));
        }

        let action = Action::new(name, description);
        self.actions.insert(action.name.clone(), action.clone());
        self.touch();
        Ok(action)
    }

    fn add_permission(&mut self, feature: &str, action: &str) -> AuthResult<Permission> {
        let feature = self
            .features
            .get(feature)
            .ok_or_else(|| AuthError::unknown_registry_entry(format!("feature '{}'", feature)))?;
        let action = self
            .actions
            .get(action)
            .ok_or_else(|| AuthError::unknown_registry_entry(format!("action '{}'", action)))?;

        if let Some(existing) = self
            .permission_index
            .get(&(feature.id, action.id))
            .and_then(|id| self.permissions.get(id))
        {
            return Ok(existing.clone());
        }

        let permission = Permission::new(feature, action);
        self.permission_index
            .insert((permission.feature_id, permission.action_id), permission.id);
        self.permissions.insert(permission.id, permission.clone());
        self.touch();
        Ok(permission)
    }

    fn remove_permissions_where<F>(&mut self, predicate: F) -> Vec<Uuid>
    where
        F: Fn(&Permission) -> bool,
    {
        let removed: Vec<Uuid> = self
            .permissions
            .values()
            .filter(|permission| predicate(permission))
            .map(|permission| permission.id)
            .collect();

        for id in &removed {
            if let Some(permission) = self.permissions.remove(id) {
                self.permission_index
                    .remove(&(permission.feature_id, permission.action_id));
            }
        }
        removed
    }

    fn permission(&self, feature: &str, action: &str) -> Option<&Permission> {
        let feature = self.features.get(feature)?;
        let action = self.actions.get(action)?;
        self.permission_index
            .get(&(feature.id, action.id))
            .and_then(|id| self.permissions.get(id))
    }
}

/// Registry of roles, features, actions and permissions
#[derive(Debug)]
pub struct Registry {
    state: RwLock<RegistryState>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Seed a registry from configuration
    pub fn from_config(config: &RegistryConfig) -> AuthResult<Self> {
        let mut state = RegistryState::default();

        for role in &config.roles {
            state.add_role(&role.name, role.description.clone())?;
        }
        for feature in &config.features {
            state.add_feature(&feature.name, feature.description.clone())?;
        }
        for action in &config.actions {
            state.add_action(&action.name, action.description.clone())?;
        }

        if config.seed_all_permissions {
            let features: Vec<String> = state.features.keys().cloned().collect();
            let actions: Vec<String> = state.actions.keys().cloned().collect();
            for feature in &features {
                for action in &actions {
                    state.add_permission(feature, action)?;
                }
            }
        }

        info!(
            roles = state.roles.len(),
            features = state.features.len(),
            actions = state.actions.len(),
            permissions = state.permissions.len(),
            "Initialized registry"
        );

        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Register a new role
    pub async fn add_role(&self, name: &str, description: Option<String>) -> AuthResult<Role> {
        let role = self.state.write().await.add_role(name, description)?;
        info!("Registered role: {}", role.name);
        Ok(role)
    }

    /// Register a new feature
    pub async fn add_feature(
        &self,
        name: &str,
        description: Option<String>,
    ) -> AuthResult<Feature> {
        let feature = self.state.write().await.add_feature(name, description)?;
        info!("Registered feature: {}", feature.name);
        Ok(feature)
    }

    /// Register a new action
    pub async fn add_action(&self, name: &str, description: Option<String>) -> AuthResult<Action> {
        let action = self.state.write().await.add_action(name, description)?;
        info!("Registered action: {}", action.name);
        Ok(action)
    }

    /// Register a (feature, action) permission
    ///
    /// Returns the existing permission when the pair is already registered.
    pub async fn add_permission(&self, feature: &str, action: &str) -> AuthResult<Permission> {
        self.state.write().await.add_permission(feature, action)
    }

    /// Remove a feature and every permission derived from it
    ///
    /// Returns the ids of the removed permissions so grants can be cascaded.
    pub async fn remove_feature(&self, name: &str) -> AuthResult<Vec<Uuid>> {
        let mut state = self.state.write().await;
        let feature = state
            .features
            .remove(name)
            .ok_or_else(|| AuthError::unknown_registry_entry(format!("feature '{}'", name)))?;
        let removed = state.remove_permissions_where(|p| p.feature_id == feature.id);
        state.touch();

        info!(
            "Removed feature {} and {} derived permissions",
            name,
            removed.len()
        );
        Ok(removed)
    }

    /// Remove an action and every permission derived from it
    pub async fn remove_action(&self, name: &str) -> AuthResult<Vec<Uuid>> {
        let mut state = self.state.write().await;
        let action = state
            .actions
            .remove(name)
            .ok_or_else(|| AuthError::unknown_registry_entry(format!("action '{}'", name)))?;
        let removed = state.remove_permissions_where(|p| p.action_id == action.id);
        state.touch();

        info!(
            "Removed action {} and {} derived permissions",
            name,
            removed.len()
        );
        Ok(removed)
    }

    pub async fn role_by_name(&self, name: &str) -> Option<Role> {
        let state = self.state.read().await;
        state
            .role_names
            .get(name)
            .and_then(|id| state.roles.get(id))
            .cloned()
    }

    pub async fn role_by_id(&self, id: Uuid) -> Option<Role> {
        self.state.read().await.roles.get(&id).cloned()
    }

    pub async fn feature(&self, name: &str) -> Option<Feature> {
        self.state.read().await.features.get(name).cloned()
    }

    pub async fn action(&self, name: &str) -> Option<Action> {
        self.state.read().await.actions.get(name).cloned()
    }

    pub async fn permission(&self, feature: &str, action: &str) -> Option<Permission> {
        self.state.read().await.permission(feature, action).cloned()
    }

    pub async fn permission_by_id(&self, id: Uuid) -> Option<Permission> {
        self.state.read().await.permissions.get(&id).cloned()
    }

    pub async fn roles(&self) -> Vec<Role> {
        let state = self.state.read().await;
        let mut roles: Vec<Role> = state.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }

    pub async fn features(&self) -> Vec<Feature> {
        self.state.read().await.features.values().cloned().collect()
    }

    pub async fn actions(&self) -> Vec<Action> {
        self.state.read().await.actions.values().cloned().collect()
    }

    pub async fn permissions(&self) -> Vec<Permission> {
        let state = self.state.read().await;
        let mut permissions: Vec<Permission> = state.permissions.values().cloned().collect();
        permissions.sort_by(|a, b| a.key().cmp(&b.key()));
        permissions
    }

    /// Whether both the feature and the action are registered
    pub async fn is_registered(&self, feature: &str, action: &str) -> bool {
        let state = self.state.read().await;
        state.features.contains_key(feature) && state.actions.contains_key(action)
    }

    /// Every currently registered feature paired with every registered action
    pub async fn cross_product(&self) -> BTreeSet<PermissionKey> {
        let state = self.state.read().await;
        state
            .features
            .keys()
            .flat_map(|feature| {
                state
                    .actions
                    .keys()
                    .map(move |action| PermissionKey::new(feature.clone(), action.clone()))
            })
            .collect()
    }

    /// Map permission ids to keys, dropping ids no longer registered
    pub async fn resolve<'a, I>(&self, permission_ids: I) -> BTreeSet<PermissionKey>
    where
        I: IntoIterator<Item = &'a Uuid>,
    {
        let state = self.state.read().await;
        permission_ids
            .into_iter()
            .filter_map(|id| state.permissions.get(id))
            .filter(|p| {
                state.features.contains_key(&p.feature) && state.actions.contains_key(&p.action)
            })
            .map(Permission::key)
            .collect()
    }

    pub async fn get_stats(&self) -> RegistryStats {
        let state = self.state.read().await;
        RegistryStats {
            roles: state.roles.len(),
            features: state.features.len(),
            actions: state.actions.len(),
            permissions: state.permissions.len(),
            last_modified: state.last_modified,
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Registry {
        Registry::from_config(&RegistryConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_registry_seeding() {
        let registry = seeded();
        let stats = registry.get_stats().await;

        assert_eq!(stats.roles, 3);
        assert_eq!(stats.features, 6);
        assert_eq!(stats.actions, 4);
        assert_eq!(stats.permissions, 24);
        assert!(registry.role_by_name("Admin").await.is_some());
        assert!(registry.permission("todo_items", "read").await.is_some());
    }

    #[tokio::test]
    async fn test_registry_without_permission_seeding() {
        let config = RegistryConfig {
            seed_all_permissions: false,
            ..RegistryConfig::default()
        };
        let registry = Registry::from_config(&config).unwrap();

        assert!(registry.permissions().await.is_empty());
        assert_eq!(registry.cross_product().await.len(), 24);
    }

    #[tokio::test]
    async fn test_duplicate_names_conflict() {
        let registry = seeded();

        let result = registry.add_feature("expenses", None).await;
        assert!(matches!(result, Err(AuthError::Conflict(_))));

        let result = registry.add_action("read", None).await;
        assert!(matches!(result, Err(AuthError::Conflict(_))));

        let result = registry.add_role("User", None).await;
        assert!(matches!(result, Err(AuthError::Conflict(_))));

        let result = registry.add_role("   ", None).await;
        assert!(matches!(result, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_permission_is_idempotent() {
        let registry = seeded();
        registry.add_feature("reports", None).await.unwrap();

        let first = registry.add_permission("reports", "read").await.unwrap();
        let second = registry.add_permission("reports", "read").await.unwrap();
        assert_eq!(first.id, second.id);

        let result = registry.add_permission("reports", "export").await;
        assert!(matches!(result, Err(AuthError::UnknownRegistryEntry(_))));
    }

    #[tokio::test]
    async fn test_remove_feature_removes_derived_permissions() {
        let registry = seeded();
        let read = registry.permission("expenses", "read").await.unwrap();

        let removed = registry.remove_feature("expenses").await.unwrap();
        assert_eq!(removed.len(), 4);
        assert!(removed.contains(&read.id));
        assert!(registry.feature("expenses").await.is_none());
        assert!(registry.permission_by_id(read.id).await.is_none());
        assert!(!registry.is_registered("expenses", "read").await);

        let result = registry.remove_feature("expenses").await;
        assert!(matches!(result, Err(AuthError::UnknownRegistryEntry(_))));
    }

    #[tokio::test]
    async fn test_remove_action_removes_derived_permissions() {
        let registry = seeded();
        let removed = registry.remove_action("delete").await.unwrap();
        assert_eq!(removed.len(), 6);
        assert_eq!(registry.cross_product().await.len(), 18);
    }

    #[tokio::test]
    async fn test_cross_product_sees_new_entries() {
        let registry = seeded();
        registry.add_feature("budgets", None).await.unwrap();

        let product = registry.cross_product().await;
        assert_eq!(product.len(), 28);
        assert!(product.contains(&PermissionKey::new("budgets", "delete")));
    }

    #[tokio::test]
    async fn test_resolve_skips_unknown_ids() {
        let registry = seeded();
        let read = registry.permission("todo_items", "read").await.unwrap();
        let stale = Uuid::new_v4();

        let keys = registry.resolve([read.id, stale].iter()).await;
        assert_eq!(keys.len(), 1);
        assert!(keys.contains(&PermissionKey::new("todo_items", "read")));
    }
}
