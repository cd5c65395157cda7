//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! User management functionality

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::UserConfig;
use crate::{AuthError, AuthResult};

use super::model::{normalize_email, User};
use super::stats::{LoginRejection, UserStats};

#[derive(Debug, Default)]
struct UserStore {
    users: HashMap<Uuid, User>,
    email_to_id: HashMap<String, Uuid>,
}

/// User manager
#[derive(Debug)]
pub struct UserManager {
    /// User configuration
    config: UserConfig,

    /// Users storage
    store: Arc<RwLock<UserStore>>,

    /// Statistics
    stats: Arc<RwLock<UserStats>>,

    clock: Arc<dyn Clock>,

    /// Verified against on unknown emails so both rejection paths hash
    dummy_hash: String,
}

impl UserManager {
    /// Create new user manager on the system clock
    pub async fn new(config: UserConfig) -> AuthResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock)).await
    }

    /// Create new user manager reading time from `clock`
    pub async fn with_clock(config: UserConfig, clock: Arc<dyn Clock>) -> AuthResult<Self> {
        // Reject unusable argon2 parameters up front
        Params::new(
            config.password_hash_memory_kib,
            config.password_hash_rounds,
            1,
            None,
        )
        .map_err(|e| AuthError::configuration(format!("Invalid password hash parameters: {}", e)))?;

        let mut manager = Self {
            config,
            store: Arc::new(RwLock::new(UserStore::default())),
            stats: Arc::new(RwLock::new(UserStats::default())),
            clock,
            dummy_hash: String::new(),
        };
        manager.dummy_hash = manager.hash_password(&Uuid::new_v4().to_string())?;
        Ok(manager)
    }

    /// Create new user
    ///
    /// `created_by`, when given, must reference an existing user.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        role_id: Uuid,
        created_by: Option<Uuid>,
    ) -> AuthResult<User> {
        let email = normalize_email(email)?;
        self.validate_password(password)?;

        let password_hash = self.hash_password(password)?;
        let user = User::new_at(email, password_hash, role_id, created_by, self.clock.now());

        {
            let mut store = self.store.write().await;
            if store.email_to_id.contains_key(&user.email) {
                return Err(AuthError::conflict(format!(
                    "Email already registered: {}",
                    user.email
                )));
            }
            if let Some(creator) = created_by {
                if !store.users.contains_key(&creator) {
                    return Err(AuthError::user_not_found(creator.to_string()));
                }
            }
            store.email_to_id.insert(user.email.clone(), user.id);
            store.users.insert(user.id, user.clone());
        }

        // Update statistics
        {
            let mut stats = self.stats.write().await;
            stats.record_created(user.created_at);
        }

        info!("Created user: {}", user.email);
        Ok(user)
    }

    /// Get user by ID
    pub async fn get_user_by_id(&self, user_id: Uuid) -> Option<User> {
        let store = self.store.read().await;
        store.users.get(&user_id).cloned()
    }

    /// Get user by email
    pub async fn get_user_by_email(&self, email: &str) -> Option<User> {
        let email = normalize_email(email).ok()?;
        let store = self.store.read().await;
        store
            .email_to_id
            .get(&email)
            .and_then(|id| store.users.get(id))
            .cloned()
    }

    /// List users ordered by email
    pub async fn list_users(&self) -> Vec<User> {
        let store = self.store.read().await;
        let mut users: Vec<User> = store.users.values().cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        users
    }

    /// Verify login credentials
    ///
    /// Unknown emails and wrong passwords are indistinguishable to the
    /// caller. The active flag is only consulted once the password matched.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> AuthResult<User> {
        let user = match self.get_user_by_email(email).await {
            Some(user) => user,
            None => {
                let _ = self.verify_password_hash(password, &self.dummy_hash);
                self.stats
                    .write()
                    .await
                    .record_rejection(LoginRejection::UnknownEmail);
                debug!("Login rejected: unknown email");
                return Err(AuthError::invalid_credentials("Invalid email or password"));
            }
        };

        if !self.verify_password_hash(password, &user.password_hash) {
            self.stats
                .write()
                .await
                .record_rejection(LoginRejection::BadPassword);
            debug!("Login rejected: bad password for user {}", user.id);
            return Err(AuthError::invalid_credentials("Invalid email or password"));
        }

        if !user.is_active {
            self.stats
                .write()
                .await
                .record_rejection(LoginRejection::Inactive);
            return Err(AuthError::user_inactive(user.id.to_string()));
        }

        let now = self.clock.now();
        let user = self
            .update_user(user.id, |user| {
                user.last_login_at = Some(now);
                Ok(())
            })
            .await?;

        self.stats.write().await.record_login(now);
        Ok(user)
    }

    /// Activate or deactivate a user
    pub async fn set_active(&self, user_id: Uuid, is_active: bool) -> AuthResult<User> {
        let user = self
            .update_user(user_id, |user| {
                user.is_active = is_active;
                Ok(())
            })
            .await?;

        self.stats.write().await.record_active_change(is_active);
        info!("Set user {} active={}", user.email, is_active);
        Ok(user)
    }

    /// Assign a new registry role
    pub async fn set_role(&self, user_id: Uuid, role_id: Uuid) -> AuthResult<User> {
        let user = self
            .update_user(user_id, |user| {
                user.role_id = role_id;
                Ok(())
            })
            .await?;

        self.stats.write().await.record_role_change();
        info!("Changed role of user {} to {}", user.email, role_id);
        Ok(user)
    }

    /// Replace a user's password after checking the current one
    ///
    /// A wrong current password is a `Validation` error, not a login
    /// failure.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<User> {
        let user = self
            .get_user_by_id(user_id)
            .await
            .ok_or_else(|| AuthError::user_not_found(user_id.to_string()))?;
        if !self.verify_password_hash(current_password, &user.password_hash) {
            return Err(AuthError::validation("Current password is incorrect"));
        }
        if current_password == new_password {
            return Err(AuthError::validation(
                "New password must differ from the current password",
            ));
        }

        self.validate_password(new_password)?;
        let password_hash = self.hash_password(new_password)?;

        let user = self
            .update_user(user_id, move |user| {
                user.password_hash = password_hash;
                user.password_changed = true;
                Ok(())
            })
            .await?;

        info!("Changed password of user {}", user.email);
        Ok(user)
    }

    /// Delete a user
    ///
    /// Users created by the deleted account keep existing with `created_by`
    /// cleared.
    pub async fn delete_user(&self, user_id: Uuid) -> AuthResult<User> {
        let user = {
            let mut store = self.store.write().await;
            let user = store
                .users
                .remove(&user_id)
                .ok_or_else(|| AuthError::user_not_found(user_id.to_string()))?;
            store.email_to_id.remove(&user.email);

            let now = self.clock.now();
            for other in store.users.values_mut() {
                if other.created_by == Some(user_id) {
                    other.created_by = None;
                    other.updated_at = now;
                }
            }
            user
        };

        self.stats.write().await.record_deleted();

        info!("Deleted user: {}", user.email);
        Ok(user)
    }

    /// Get user statistics
    pub async fn get_stats(&self) -> UserStats {
        let stats = self.stats.read().await;
        stats.clone()
    }

    async fn update_user<F>(&self, user_id: Uuid, update: F) -> AuthResult<User>
    where
        F: FnOnce(&mut User) -> AuthResult<()>,
    {
        let mut store = self.store.write().await;
        let user = store
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AuthError::user_not_found(user_id.to_string()))?;
        update(user)?;
        user.updated_at = self.clock.now();
        Ok(user.clone())
    }

    /// Validate password
    fn validate_password(&self, password: &str) -> AuthResult<()> {
        match self.config.password_violation(password) {
            Some(violation) => Err(AuthError::validation(violation)),
            None => Ok(()),
        }
    }

    fn hasher(&self) -> AuthResult<Argon2<'static>> {
        let params = Params::new(
            self.config.password_hash_memory_kib,
            self.config.password_hash_rounds,
            1,
            None,
        )
        .map_err(|e| AuthError::internal(format!("Invalid password hash parameters: {}", e)))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash password
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .hasher()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::internal(format!("Password hashing failed: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Verify password hash
    ///
    /// Parameters are read from the PHC string, so hashes made under an
    /// older configuration still verify.
    fn verify_password_hash(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}
