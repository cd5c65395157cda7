//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Token issuance, validation, rotation, revocation and cleanup

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::{CleanupConfig, JwtConfig};
use crate::jwt::{JwtClaims, JwtManager, TokenType};
use crate::users::User;
use crate::{AuthError, AuthResult};

use super::model::{
    CleanupReport, RevokeOutcome, TokenPair, TokenRecord, TokenStatistics, ValidatedToken,
};
use super::stats::TokenStats;
use super::store::TokenStore;

/// Token service
pub struct TokenService {
    jwt: JwtManager,
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    retention: chrono::Duration,
    stats: Arc<RwLock<TokenStats>>,
}

impl TokenService {
    /// Create new token service
    pub fn new(
        jwt_config: JwtConfig,
        cleanup_config: &CleanupConfig,
        store: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
    ) -> AuthResult<Self> {
        Ok(Self {
            jwt: JwtManager::new(jwt_config)?,
            store,
            clock,
            retention: cleanup_config.retention()?,
            stats: Arc::new(RwLock::new(TokenStats::default())),
        })
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Issue an access and refresh token for a user
    pub async fn issue(&self, user: &User) -> AuthResult<TokenPair> {
        self.issue_for(user.id, &user.email).await
    }

    async fn issue_for(&self, user_id: Uuid, email: &str) -> AuthResult<TokenPair> {
        let now = self.clock.now();
        let access = JwtClaims::new(user_id, email, TokenType::Access, self.jwt.config(), now)?;
        let refresh = JwtClaims::new(user_id, email, TokenType::Refresh, self.jwt.config(), now)?;

        let access_token = self.jwt.encode(&access)?;
        let refresh_token = self.jwt.encode(&refresh)?;

        for claims in [&access, &refresh] {
            let record = TokenRecord::new(
                claims.token_id()?,
                user_id,
                claims.token_type,
                claims.expiration_time()?,
                now,
            );
            self.store.insert(record).await?;
        }

        self.stats.write().await.increment_pairs_issued(now);

        info!(
            user_id = %user_id,
            access_jti = %access.jti,
            refresh_jti = %refresh.jti,
            "Issued token pair"
        );

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
            expires_in: access.exp - access.iat,
            refresh_expires_in: refresh.exp - refresh.iat,
        })
    }

    /// Validate a token of the expected type
    ///
    /// Fails with `InvalidToken` for a bad signature, issuer, audience or
    /// token type, with `Expired` once the clock reaches the expiry, and with
    /// `Revoked` when the record is revoked or gone.
    pub async fn validate(&self, token: &str, expected: TokenType) -> AuthResult<ValidatedToken> {
        let result = self.check(token, expected).await;
        self.stats.write().await.record_validation(result.is_ok());

        if let Err(e) = &result {
            debug!("Token validation failed: {}", e);
        }
        result
    }

    async fn check(&self, token: &str, expected: TokenType) -> AuthResult<ValidatedToken> {
        let claims = self.jwt.decode(token)?;

        if claims.token_type != expected {
            return Err(AuthError::invalid_token(format!(
                "Expected {} token, got {}",
                expected, claims.token_type
            )));
        }

        let now = self.clock.now();
        if claims.is_expired_at(now) {
            return Err(AuthError::expired(format!("Token {} has expired", claims.jti)));
        }

        let jti = claims.token_id()?;
        let user_id = claims.user_id()?;

        let record = self
            .store
            .get(jti)
            .await?
            .ok_or_else(|| AuthError::revoked(format!("Token {} is not on record", jti)))?;

        if record.revoked {
            return Err(AuthError::revoked(format!("Token {} has been revoked", jti)));
        }
        if record.is_expired_at(now) {
            return Err(AuthError::expired(format!("Token {} has expired", jti)));
        }

        if expected == TokenType::Access {
            self.store.touch(jti, now).await?;
        }

        Ok(ValidatedToken {
            user_id,
            jti,
            claims,
        })
    }

    /// Validate a refresh token and revoke it in one step
    ///
    /// Exactly one of any number of concurrent callers presenting the same
    /// refresh token succeeds; the rest get `Revoked`.
    pub async fn rotate(&self, refresh_token: &str) -> AuthResult<ValidatedToken> {
        let validated = self.validate(refresh_token, TokenType::Refresh).await?;

        match self.store.consume(validated.jti, self.clock.now()).await? {
            RevokeOutcome::Revoked(_) => {
                let mut stats = self.stats.write().await;
                stats.add_tokens_revoked(1);
                stats.increment_tokens_refreshed();
                Ok(validated)
            }
            RevokeOutcome::AlreadyRevoked | RevokeOutcome::Missing => {
                warn!(
                    user_id = %validated.user_id,
                    jti = %validated.jti,
                    "Refresh token reuse rejected"
                );
                Err(AuthError::revoked(format!(
                    "Refresh token {} already used",
                    validated.jti
                )))
            }
            RevokeOutcome::Expired => Err(AuthError::expired(format!(
                "Refresh token {} has expired",
                validated.jti
            ))),
        }
    }

    /// Exchange a refresh token for a new pair
    ///
    /// The new pair carries the identity of the old refresh token. Callers
    /// that need to re-check the account use [`rotate`](Self::rotate) and
    /// [`issue`](Self::issue) directly.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let validated = self.rotate(refresh_token).await?;
        self.issue_for(validated.user_id, &validated.claims.email)
            .await
    }

    /// Revoke a token
    ///
    /// The signature must verify but expiry is ignored. Revoking an already
    /// revoked or unknown token succeeds; returns whether this call flipped
    /// the record.
    pub async fn revoke(&self, token: &str) -> AuthResult<bool> {
        let claims = self.jwt.decode(token)?;
        let jti = claims.token_id()?;

        match self.store.revoke(jti, self.clock.now()).await? {
            RevokeOutcome::Revoked(record) => {
                self.stats.write().await.add_tokens_revoked(1);
                info!(
                    user_id = %record.user_id,
                    jti = %jti,
                    token_type = %record.token_type,
                    "Revoked token"
                );
                Ok(true)
            }
            _ => {
                debug!("Token {} already inert", jti);
                Ok(false)
            }
        }
    }

    /// Revoke every active token of a user
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> AuthResult<usize> {
        let revoked = self
            .store
            .revoke_all_for_user(user_id, self.clock.now())
            .await?;

        if revoked > 0 {
            self.stats.write().await.add_tokens_revoked(revoked as u64);
            info!("Revoked {} tokens of user {}", revoked, user_id);
        }
        Ok(revoked)
    }

    /// Remove every token record of a user
    pub async fn delete_all_for_user(&self, user_id: Uuid) -> AuthResult<usize> {
        let deleted = self.store.delete_all_for_user(user_id).await?;
        debug!("Deleted {} token records of user {}", deleted, user_id);
        Ok(deleted)
    }

    /// Remove expired records and revoked records past the retention window
    pub async fn cleanup_expired(&self) -> AuthResult<CleanupReport> {
        let now = self.clock.now();
        let expired = self.store.delete_expired(now).await?;
        let cutoff = now
            .checked_sub_signed(self.retention)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let revoked = self.store.delete_revoked_before(cutoff).await?;
        let report = CleanupReport::new(expired, revoked, now);

        self.stats
            .write()
            .await
            .record_cleanup(report.total_removed as u64, now);

        if report.total_removed > 0 {
            info!(
                access = report.access_tokens_removed,
                refresh = report.refresh_tokens_removed,
                total = report.total_removed,
                "Token cleanup removed records"
            );
        } else {
            debug!("Token cleanup found nothing to remove");
        }
        Ok(report)
    }

    /// Per-type record counts
    pub async fn statistics(&self) -> AuthResult<TokenStatistics> {
        self.store.statistics(self.clock.now()).await
    }

    pub async fn get_stats(&self) -> TokenStats {
        self.stats.read().await.clone()
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("jwt", &self.jwt)
            .field("store", &self.store)
            .field("clock", &self.clock)
            .field("retention", &self.retention)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::tokens::InMemoryTokenStore;
    use chrono::Duration;

    struct Fixture {
        service: TokenService,
        store: Arc<InMemoryTokenStore>,
        clock: ManualClock,
        user: User,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryTokenStore::new());
        let clock = ManualClock::starting_now();
        let config = JwtConfig {
            secret: "token-service-secret".to_string(),
            ..JwtConfig::default()
        };
        let service = TokenService::new(
            config,
            &CleanupConfig::default(),
            store.clone(),
            Arc::new(clock.clone()),
        )
        .unwrap();
        let user = User::new("tokens@example.com".to_string(), String::new(), Uuid::new_v4(), None);

        Fixture {
            service,
            store,
            clock,
            user,
        }
    }

    #[tokio::test]
    async fn test_issue_records_both_tokens() {
        let f = fixture();
        let pair = f.service.issue(&f.user).await.unwrap();

        assert_eq!(pair.token_type, "bearer");
        assert_eq!(pair.expires_in, 3600);
        assert_eq!(f.store.len().await, 2);

        let access = f
            .service
            .validate(&pair.access_token, TokenType::Access)
            .await
            .unwrap();
        assert_eq!(access.user_id, f.user.id);
        let record = f.store.get(access.jti).await.unwrap().unwrap();
        assert!(!record.revoked);
        assert!(record.last_used_at.is_some());
    }

    #[tokio::test]
    async fn test_wrong_token_type_is_invalid() {
        let f = fixture();
        let pair = f.service.issue(&f.user).await.unwrap();

        let result = f.service.validate(&pair.refresh_token, TokenType::Access).await;
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));

        let result = f.service.validate(&pair.access_token, TokenType::Refresh).await;
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_expiry_follows_clock() {
        let f = fixture();
        let pair = f.service.issue(&f.user).await.unwrap();

        f.clock.advance(Duration::minutes(59));
        assert!(f
            .service
            .validate(&pair.access_token, TokenType::Access)
            .await
            .is_ok());

        f.clock.advance(Duration::minutes(1));
        let result = f.service.validate(&pair.access_token, TokenType::Access).await;
        assert!(matches!(result, Err(AuthError::Expired(_))));

        // Refresh token outlives the access token
        assert!(f
            .service
            .validate(&pair.refresh_token, TokenType::Refresh)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_missing_record_is_revoked() {
        let f = fixture();
        let pair = f.service.issue(&f.user).await.unwrap();
        f.service.delete_all_for_user(f.user.id).await.unwrap();

        let result = f.service.validate(&pair.access_token, TokenType::Access).await;
        assert!(matches!(result, Err(AuthError::Revoked(_))));
    }

    #[tokio::test]
    async fn test_refresh_rotates_once() {
        let f = fixture();
        let pair = f.service.issue(&f.user).await.unwrap();

        let rotated = f.service.refresh(&pair.refresh_token).await.unwrap();
        assert_ne!(rotated.refresh_token, pair.refresh_token);
        let validated = f
            .service
            .validate(&rotated.access_token, TokenType::Access)
            .await
            .unwrap();
        assert_eq!(validated.user_id, f.user.id);
        assert_eq!(validated.claims.email, f.user.email);

        let result = f.service.refresh(&pair.refresh_token).await;
        assert!(matches!(result, Err(AuthError::Revoked(_))));

        // The access token of the first pair is untouched by rotation
        assert!(f
            .service
            .validate(&pair.access_token, TokenType::Access)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let f = fixture();
        let pair = f.service.issue(&f.user).await.unwrap();

        assert!(f.service.revoke(&pair.access_token).await.unwrap());
        assert!(!f.service.revoke(&pair.access_token).await.unwrap());

        let result = f.service.validate(&pair.access_token, TokenType::Access).await;
        assert!(matches!(result, Err(AuthError::Revoked(_))));

        assert!(matches!(
            f.service.revoke("garbage").await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_revoke_accepts_expired_token() {
        let f = fixture();
        let pair = f.service.issue(&f.user).await.unwrap();
        f.clock.advance(Duration::hours(2));

        assert!(f.service.revoke(&pair.access_token).await.unwrap());
    }

    #[tokio::test]
    async fn test_cleanup_respects_lifetimes_and_retention() {
        let f = fixture();
        let pair = f.service.issue(&f.user).await.unwrap();

        let report = f.service.cleanup_expired().await.unwrap();
        assert_eq!(report.total_removed, 0);
        assert_eq!(f.store.len().await, 2);

        f.clock.advance(Duration::hours(1) + Duration::seconds(1));
        let report = f.service.cleanup_expired().await.unwrap();
        assert_eq!(report.access_tokens_removed, 1);
        assert_eq!(report.refresh_tokens_removed, 0);
        assert!(f
            .service
            .validate(&pair.refresh_token, TokenType::Refresh)
            .await
            .is_ok());

        // Revoked refresh token is kept for the retention window
        f.service.revoke(&pair.refresh_token).await.unwrap();
        f.clock.advance(Duration::days(1));
        assert_eq!(f.service.cleanup_expired().await.unwrap().total_removed, 0);

        f.clock.advance(Duration::days(29));
        let report = f.service.cleanup_expired().await.unwrap();
        assert_eq!(report.total_removed, 1);
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_statistics_by_type() {
        let f = fixture();
        let first = f.service.issue(&f.user).await.unwrap();
        f.service.issue(&f.user).await.unwrap();
        f.service.revoke(&first.refresh_token).await.unwrap();

        let stats = f.service.statistics().await.unwrap();
        assert_eq!(stats.access_tokens.total, 2);
        assert_eq!(stats.access_tokens.active, 2);
        assert_eq!(stats.refresh_tokens.revoked, 1);
        assert_eq!(stats.refresh_tokens.active, 1);

        f.clock.advance(Duration::hours(2));
        let stats = f.service.statistics().await.unwrap();
        assert_eq!(stats.access_tokens.expired, 2);
    }
}
