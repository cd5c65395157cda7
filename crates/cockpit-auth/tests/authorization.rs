//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Integration tests for permission resolution and the guard
//!
//! These exercise the registry, the resolver and the guard together through
//! the public `AuthManager` surface.

use cockpit_auth::{require, AuthConfig, AuthError, AuthManager, PermissionKey};
use std::collections::BTreeSet;

const PASSWORD: &str = "Integr4tionPass";

fn test_config() -> AuthConfig {
    let mut config = AuthConfig::default();
    config.jwt.secret = "authorization-integration-secret".to_string();
    config.users.password_hash_memory_kib = 64;
    config.users.password_hash_rounds = 1;
    config
}

#[tokio::test]
async fn test_admin_holds_full_cross_product() {
    let auth = AuthManager::new(test_config()).await.unwrap();
    let admin = auth
        .create_user("admin@example.com", PASSWORD, "Admin", None)
        .await
        .unwrap();

    let features = auth.registry().features().await;
    let actions = auth.registry().actions().await;
    assert!(!features.is_empty());
    assert!(!actions.is_empty());

    for feature in &features {
        for action in &actions {
            assert!(
                auth.authorize(admin.id, &feature.name, &action.name)
                    .await
                    .unwrap(),
                "admin denied {}:{}",
                feature.name,
                action.name
            );
        }
    }

    // Entries registered at runtime are visible immediately
    auth.registry()
        .add_feature("budgets", Some("Monthly budgets".to_string()))
        .await
        .unwrap();
    auth.registry().add_permission("budgets", "read").await.unwrap();
    assert!(auth.authorize(admin.id, "budgets", "read").await.unwrap());

    let effective = auth.user_permissions(admin.id).await.unwrap();
    assert_eq!(effective, auth.registry().cross_product().await);
    assert!(effective.contains(&PermissionKey::new("budgets", "read")));

    // Unregistered pairs are denied even for admins
    assert!(!auth.authorize(admin.id, "budgets", "approve").await.unwrap());
}

#[tokio::test]
async fn test_non_admin_holds_exactly_granted_pairs() {
    let auth = AuthManager::new(test_config()).await.unwrap();
    let user = auth
        .create_user("member@example.com", PASSWORD, "User", None)
        .await
        .unwrap();

    let granted: BTreeSet<PermissionKey> = [
        PermissionKey::new("expenses", "create"),
        PermissionKey::new("expenses", "read"),
        PermissionKey::new("categories", "read"),
    ]
    .into_iter()
    .collect();
    let keys: Vec<_> = granted.iter().cloned().collect();
    auth.grant_permissions(user.id, &keys, None).await.unwrap();

    for key in auth.registry().cross_product().await {
        let allowed = auth
            .authorize(user.id, &key.feature, &key.action)
            .await
            .unwrap();
        assert_eq!(allowed, granted.contains(&key), "mismatch on {}", key);
    }

    assert_eq!(auth.user_permissions(user.id).await.unwrap(), granted);
}

#[tokio::test]
async fn test_todo_read_grant_example() {
    let auth = AuthManager::new(test_config()).await.unwrap();
    auth.create_user("admin@example.com", PASSWORD, "Admin", None)
        .await
        .unwrap();
    let user = auth
        .create_user("reader@example.com", PASSWORD, "User", None)
        .await
        .unwrap();
    auth.grant_permission(user.id, "todo_items", "read", None)
        .await
        .unwrap();

    let reader = auth.login("reader@example.com", PASSWORD).await.unwrap();
    let admin = auth.login("admin@example.com", PASSWORD).await.unwrap();

    let read = require("todo_items", "read");
    let delete = require("todo_items", "delete");

    assert!(read.check(&auth, Some(&reader.access_token)).await.is_ok());
    assert!(matches!(
        delete.check(&auth, Some(&reader.access_token)).await,
        Err(AuthError::NotAuthorized(_))
    ));
    assert!(delete.check(&auth, Some(&admin.access_token)).await.is_ok());
}

#[tokio::test]
async fn test_inactive_admin_holds_nothing() {
    let auth = AuthManager::new(test_config()).await.unwrap();
    let admin = auth
        .create_user("dormant@example.com", PASSWORD, "Admin", None)
        .await
        .unwrap();

    auth.deactivate_user(admin.id).await.unwrap();
    assert!(!auth.authorize(admin.id, "users", "read").await.unwrap());
    assert!(auth.user_permissions(admin.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deleted_feature_leaves_no_grants_behind() {
    let auth = AuthManager::new(test_config()).await.unwrap();
    let user = auth
        .create_user("stale@example.com", PASSWORD, "User", None)
        .await
        .unwrap();
    auth.grant_permission(user.id, "payment_methods", "update", None)
        .await
        .unwrap();

    assert_eq!(auth.remove_feature("payment_methods").await.unwrap(), 1);
    assert!(!auth
        .authorize(user.id, "payment_methods", "update")
        .await
        .unwrap());

    // Re-registering the name does not resurrect the old grant
    auth.registry()
        .add_feature("payment_methods", None)
        .await
        .unwrap();
    auth.registry()
        .add_permission("payment_methods", "update")
        .await
        .unwrap();
    assert!(!auth
        .authorize(user.id, "payment_methods", "update")
        .await
        .unwrap());
    assert!(auth
        .permission_manager()
        .user_grants(user.id)
        .await
        .is_empty());
}
