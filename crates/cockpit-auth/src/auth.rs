//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Main authentication module

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::guard::PermissionRequirement;
use crate::jwt::TokenType;
use crate::permissions::{PermissionKey, PermissionManager, PermissionResolver, UserPermission};
use crate::registry::Registry;
use crate::tokens::{
    CleanupReport, InMemoryTokenStore, TokenCleanupHandle, TokenCleanupTask, TokenPair,
    TokenService, TokenStatistics, TokenStore,
};
use crate::users::{User, UserManager};

/// Authentication result type
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired: {0}")]
    Expired(String),

    #[error("Token revoked: {0}")]
    Revoked(String),

    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("User inactive: {0}")]
    UserInactive(String),

    #[error("Unknown registry entry: {0}")]
    UnknownRegistryEntry(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::InvalidToken(msg.into())
    }

    pub fn expired(msg: impl Into<String>) -> Self {
        Self::Expired(msg.into())
    }

    pub fn revoked(msg: impl Into<String>) -> Self {
        Self::Revoked(msg.into())
    }

    pub fn not_authenticated(msg: impl Into<String>) -> Self {
        Self::NotAuthenticated(msg.into())
    }

    pub fn not_authorized(msg: impl Into<String>) -> Self {
        Self::NotAuthorized(msg.into())
    }

    pub fn user_inactive(msg: impl Into<String>) -> Self {
        Self::UserInactive(msg.into())
    }

    pub fn unknown_registry_entry(msg: impl Into<String>) -> Self {
        Self::UnknownRegistryEntry(msg.into())
    }

    pub fn user_not_found(msg: impl Into<String>) -> Self {
        Self::UserNotFound(msg.into())
    }

    pub fn invalid_credentials(msg: impl Into<String>) -> Self {
        Self::InvalidCredentials(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this is a token-layer failure
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken(_) | Self::Expired(_) | Self::Revoked(_)
        )
    }

    /// Collapse into what a guarded caller is allowed to see
    ///
    /// Token-layer failures and unusable accounts become `NotAuthenticated`
    /// with a fixed message; everything else passes through.
    pub fn into_guard_error(self) -> Self {
        match self {
            Self::InvalidToken(_)
            | Self::Expired(_)
            | Self::Revoked(_)
            | Self::UserInactive(_)
            | Self::UserNotFound(_) => {
                Self::not_authenticated("Could not validate credentials")
            }
            other => other,
        }
    }
}

/// Authentication manager
pub struct AuthManager {
    /// Configuration
    config: AuthConfig,

    registry: Arc<Registry>,

    /// User manager
    user_manager: Arc<UserManager>,

    /// Permission manager
    permission_manager: Arc<PermissionManager>,

    resolver: PermissionResolver,

    token_service: Arc<TokenService>,

    /// Statistics
    stats: Arc<RwLock<AuthStats>>,
}

impl AuthManager {
    /// Create new authentication manager
    ///
    /// Token records are kept in memory and time comes from the system clock.
    pub async fn new(config: AuthConfig) -> AuthResult<Self> {
        Self::with_components(
            config,
            Arc::new(InMemoryTokenStore::new()),
            Arc::new(SystemClock),
        )
        .await
    }

    /// Create an authentication manager over a given token store and clock
    pub async fn with_components(
        config: AuthConfig,
        token_store: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
    ) -> AuthResult<Self> {
        info!("Creating authentication manager");
        config.validate()?;

        let registry = Arc::new(Registry::from_config(&config.registry)?);
        let user_manager =
            Arc::new(UserManager::with_clock(config.users.clone(), clock.clone()).await?);
        let permission_manager = Arc::new(PermissionManager::new().await?);
        let resolver = PermissionResolver::new(
            registry.clone(),
            permission_manager.clone(),
            config.rbac.admin_role.clone(),
        );
        let token_service = Arc::new(TokenService::new(
            config.jwt.clone(),
            &config.cleanup,
            token_store,
            clock,
        )?);

        Ok(Self {
            config,
            registry,
            user_manager,
            permission_manager,
            resolver,
            token_service,
            stats: Arc::new(RwLock::new(AuthStats::default())),
        })
    }

    /// Exchange credentials for a token pair
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<TokenPair> {
        let result = match self.user_manager.verify_credentials(email, password).await {
            Ok(user) => self.token_service.issue(&user).await,
            Err(e) => Err(e),
        };

        // Update statistics
        {
            let mut stats = self.stats.write().await;
            match &result {
                Ok(_) => {
                    stats.successful_logins += 1;
                    stats.last_login = Some(self.now());
                }
                Err(_) => stats.failed_logins += 1,
            }
        }

        if let Err(e) = &result {
            warn!("Login rejected: {}", e);
        }
        result
    }

    /// Rotate a refresh token into a new pair
    ///
    /// The account is re-read so a user deactivated or deleted since the
    /// last login cannot keep a session alive.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let validated = self.token_service.rotate(refresh_token).await?;

        let user = self
            .user_manager
            .get_user_by_id(validated.user_id)
            .await
            .ok_or_else(|| {
                AuthError::not_authenticated(format!("User {} no longer exists", validated.user_id))
            })?;
        if !user.is_active {
            return Err(AuthError::user_inactive(user.email));
        }

        let pair = self.token_service.issue(&user).await?;
        self.stats.write().await.token_refreshes += 1;
        Ok(pair)
    }

    /// Revoke the tokens of a session
    ///
    /// Both tokens are always attempted. A refresh token that does not
    /// verify is inert and only logged; an access token that does not
    /// verify is reported after the refresh token was handled. Returns
    /// whether every presented token was flipped by this call.
    pub async fn logout(&self, access_token: &str, refresh_token: Option<&str>) -> AuthResult<bool> {
        let access_result = self.token_service.revoke(access_token).await;
        let refresh_revoked = match refresh_token {
            Some(token) => match self.token_service.revoke(token).await {
                Ok(flipped) => flipped,
                Err(e) => {
                    warn!("Ignoring unusable refresh token on logout: {}", e);
                    false
                }
            },
            None => true,
        };

        self.stats.write().await.logouts += 1;
        let access_revoked = access_result?;
        debug!(access_revoked, refresh_revoked, "Logout processed");
        Ok(access_revoked && refresh_revoked)
    }

    /// Resolve an access token to its active user
    ///
    /// Token failures are returned as-is. A missing or inactive account is
    /// `NotAuthenticated`.
    pub async fn authenticate(&self, access_token: &str) -> AuthResult<User> {
        let result = self.resolve_user(access_token).await;

        {
            let mut stats = self.stats.write().await;
            match &result {
                Ok(_) => stats.successful_authentications += 1,
                Err(_) => stats.failed_authentications += 1,
            }
            stats.last_authentication = Some(self.now());
        }

        result
    }

    async fn resolve_user(&self, access_token: &str) -> AuthResult<User> {
        let validated = self
            .token_service
            .validate(access_token, TokenType::Access)
            .await?;

        let user = self
            .user_manager
            .get_user_by_id(validated.user_id)
            .await
            .ok_or_else(|| {
                AuthError::not_authenticated(format!("User {} no longer exists", validated.user_id))
            })?;

        if !user.is_active {
            return Err(AuthError::not_authenticated(format!(
                "User {} is inactive",
                user.id
            )));
        }
        Ok(user)
    }

    /// Whether a user may perform `action` on `feature`
    ///
    /// Unknown users are simply not authorized.
    pub async fn authorize(&self, user_id: Uuid, feature: &str, action: &str) -> AuthResult<bool> {
        let allowed = match self.user_manager.get_user_by_id(user_id).await {
            Some(user) => self.resolver.has_permission(&user, feature, action).await,
            None => {
                debug!("Authorization for unknown user {}", user_id);
                false
            }
        };

        self.record_authorization(allowed).await;
        Ok(allowed)
    }

    /// Run a guard requirement against a token
    pub async fn check(
        &self,
        access_token: Option<&str>,
        requirement: &PermissionRequirement,
    ) -> AuthResult<User> {
        requirement.check(self, access_token).await
    }

    pub(crate) async fn record_authorization(&self, allowed: bool) {
        let mut stats = self.stats.write().await;
        stats.authorizations += 1;
        if !allowed {
            stats.authorization_denials += 1;
        }
        stats.last_authorization = Some(self.now());
    }

    /// Create a user in the named role
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        role: &str,
        created_by: Option<Uuid>,
    ) -> AuthResult<User> {
        let role = self
            .registry
            .role_by_name(role)
            .await
            .ok_or_else(|| AuthError::unknown_registry_entry(format!("role {}", role)))?;

        self.user_manager
            .create_user(email, password, role.id, created_by)
            .await
    }

    /// Create a user in the configured default role
    pub async fn register(&self, email: &str, password: &str) -> AuthResult<User> {
        self.create_user(email, password, &self.config.rbac.default_role, None)
            .await
    }

    pub async fn get_user(&self, user_id: Uuid) -> AuthResult<User> {
        self.user_manager
            .get_user_by_id(user_id)
            .await
            .ok_or_else(|| AuthError::user_not_found(user_id.to_string()))
    }

    pub async fn activate_user(&self, user_id: Uuid) -> AuthResult<User> {
        self.user_manager.set_active(user_id, true).await
    }

    /// Deactivate a user and revoke every token they hold
    pub async fn deactivate_user(&self, user_id: Uuid) -> AuthResult<User> {
        let user = self.user_manager.set_active(user_id, false).await?;
        let revoked = self.token_service.revoke_all_for_user(user_id).await?;
        info!("Deactivated user {}, revoked {} tokens", user.email, revoked);
        Ok(user)
    }

    /// Replace a user's password
    ///
    /// Every token the user holds is revoked and a fresh pair is issued,
    /// so other sessions end while the caller stays signed in.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<TokenPair> {
        let user = self
            .user_manager
            .change_password(user_id, current_password, new_password)
            .await?;
        let revoked = self.token_service.revoke_all_for_user(user_id).await?;
        info!(
            "Changed password for user {}, revoked {} tokens",
            user.email, revoked
        );

        self.token_service.issue(&user).await
    }

    /// Move a user to another role
    pub async fn change_role(&self, user_id: Uuid, role: &str) -> AuthResult<User> {
        let role = self
            .registry
            .role_by_name(role)
            .await
            .ok_or_else(|| AuthError::unknown_registry_entry(format!("role {}", role)))?;

        self.user_manager.set_role(user_id, role.id).await
    }

    /// Delete a user together with their grants and token records
    pub async fn delete_user(&self, user_id: Uuid) -> AuthResult<User> {
        let user = self.user_manager.delete_user(user_id).await?;
        let grants = self.permission_manager.revoke_all_for_user(user_id).await;
        let tokens = self.token_service.delete_all_for_user(user_id).await?;

        info!(
            "Deleted user {} with {} grants and {} token records",
            user.email, grants, tokens
        );
        Ok(user)
    }

    /// Grant one (feature, action) pair to a user
    pub async fn grant_permission(
        &self,
        user_id: Uuid,
        feature: &str,
        action: &str,
        granted_by: Option<Uuid>,
    ) -> AuthResult<UserPermission> {
        self.get_user(user_id).await?;
        let permission = self.lookup_permission(feature, action).await?;

        self.permission_manager
            .grant(user_id, permission.id, granted_by)
            .await
    }

    /// Grant several pairs at once; nothing is stored if any one fails
    pub async fn grant_permissions(
        &self,
        user_id: Uuid,
        keys: &[PermissionKey],
        granted_by: Option<Uuid>,
    ) -> AuthResult<Vec<UserPermission>> {
        self.get_user(user_id).await?;

        let mut permission_ids = Vec::with_capacity(keys.len());
        for key in keys {
            let permission = self.lookup_permission(&key.feature, &key.action).await?;
            permission_ids.push(permission.id);
        }

        self.permission_manager
            .grant_many(user_id, &permission_ids, granted_by)
            .await
    }

    /// Remove a grant, returning whether one existed
    pub async fn revoke_permission(
        &self,
        user_id: Uuid,
        feature: &str,
        action: &str,
    ) -> AuthResult<bool> {
        self.get_user(user_id).await?;
        let permission = self.lookup_permission(feature, action).await?;

        Ok(self.permission_manager.revoke(user_id, permission.id).await)
    }

    /// Effective permissions of a user
    pub async fn user_permissions(&self, user_id: Uuid) -> AuthResult<BTreeSet<PermissionKey>> {
        let user = self.get_user(user_id).await?;
        Ok(self.resolver.effective_permissions(&user).await)
    }

    async fn lookup_permission(
        &self,
        feature: &str,
        action: &str,
    ) -> AuthResult<crate::registry::Permission> {
        self.registry
            .permission(feature, action)
            .await
            .ok_or_else(|| {
                AuthError::unknown_registry_entry(format!("permission {}:{}", feature, action))
            })
    }

    /// Remove a feature, its permissions and every grant of them
    pub async fn remove_feature(&self, name: &str) -> AuthResult<usize> {
        let removed = self.registry.remove_feature(name).await?;
        Ok(self.purge_grants(&removed).await)
    }

    /// Remove an action, its permissions and every grant of them
    pub async fn remove_action(&self, name: &str) -> AuthResult<usize> {
        let removed = self.registry.remove_action(name).await?;
        Ok(self.purge_grants(&removed).await)
    }

    async fn purge_grants(&self, permission_ids: &[Uuid]) -> usize {
        let mut purged = 0;
        for permission_id in permission_ids {
            purged += self.permission_manager.purge_permission(*permission_id).await;
        }
        purged
    }

    /// Run one token cleanup sweep now
    pub async fn cleanup_expired_tokens(&self) -> AuthResult<CleanupReport> {
        self.token_service.cleanup_expired().await
    }

    pub async fn token_statistics(&self) -> AuthResult<TokenStatistics> {
        self.token_service.statistics().await
    }

    /// Start the periodic token sweep if cleanup is enabled
    pub fn spawn_cleanup_task(&self) -> Option<TokenCleanupHandle> {
        if !self.config.cleanup.enabled {
            info!("Token cleanup task disabled");
            return None;
        }

        let task = TokenCleanupTask::new(self.token_service.clone(), self.config.cleanup.interval());
        Some(task.spawn())
    }

    /// Get authentication statistics
    pub async fn get_stats(&self) -> AuthStats {
        let stats = self.stats.read().await;
        stats.clone()
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Get user manager
    pub fn user_manager(&self) -> &Arc<UserManager> {
        &self.user_manager
    }

    /// Get permission manager
    pub fn permission_manager(&self) -> &Arc<PermissionManager> {
        &self.permission_manager
    }

    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    pub fn token_service(&self) -> &Arc<TokenService> {
        &self.token_service
    }

    fn now(&self) -> DateTime<Utc> {
        self.token_service.clock().now()
    }

    /// Shutdown authentication manager
    pub async fn shutdown(&self) -> AuthResult<()> {
        info!("Shutting down authentication manager");

        let report = self.token_service.cleanup_expired().await?;
        if report.total_removed > 0 {
            info!("Cleaned up {} terminal token records", report.total_removed);
        }

        info!("Authentication manager shutdown completed");
        Ok(())
    }
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager")
            .field("config", &"<sensitive>")
            .field("registry", &self.registry)
            .field("user_manager", &"<sensitive>")
            .field("permission_manager", &self.permission_manager)
            .field("token_service", &"<sensitive>")
            .field("stats", &self.stats)
            .finish()
    }
}

/// Authentication statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthStats {
    /// Number of successful logins
    pub successful_logins: u64,

    /// Number of rejected logins
    pub failed_logins: u64,

    /// Number of successful authentications
    pub successful_authentications: u64,

    /// Number of failed authentications
    pub failed_authentications: u64,

    /// Number of authorizations
    pub authorizations: u64,

    /// Number of authorizations denied
    pub authorization_denials: u64,

    /// Number of token refreshes
    pub token_refreshes: u64,

    /// Number of logouts
    pub logouts: u64,

    /// Last login
    pub last_login: Option<DateTime<Utc>>,

    /// Last authentication
    pub last_authentication: Option<DateTime<Utc>>,

    /// Last authorization
    pub last_authorization: Option<DateTime<Utc>>,
}
