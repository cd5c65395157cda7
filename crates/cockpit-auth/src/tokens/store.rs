//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Token record persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::jwt::TokenType;
use crate::{AuthError, AuthResult};

use super::model::{RemovedTokens, RevokeOutcome, TokenCounts, TokenRecord, TokenStatistics};

/// Persistence seam for token records
///
/// Every mutation of a single record must be atomic with respect to other
/// calls on the same record. `consume` in particular is the check-and-set
/// that makes refresh rotation single-use.
#[async_trait]
pub trait TokenStore: Send + Sync + std::fmt::Debug {
    /// Store a new record; the jti must be unused
    async fn insert(&self, record: TokenRecord) -> AuthResult<()>;

    async fn get(&self, jti: Uuid) -> AuthResult<Option<TokenRecord>>;

    /// Stamp `last_used_at`
    async fn touch(&self, jti: Uuid, at: DateTime<Utc>) -> AuthResult<()>;

    /// Mark a record revoked regardless of expiry
    async fn revoke(&self, jti: Uuid, at: DateTime<Utc>) -> AuthResult<RevokeOutcome>;

    /// Revoke only if the record is still active at `at`
    async fn consume(&self, jti: Uuid, at: DateTime<Utc>) -> AuthResult<RevokeOutcome>;

    /// Revoke every active record of a user, returning how many flipped
    async fn revoke_all_for_user(&self, user_id: Uuid, at: DateTime<Utc>) -> AuthResult<usize>;

    /// Remove every record of a user
    async fn delete_all_for_user(&self, user_id: Uuid) -> AuthResult<usize>;

    /// Remove records with `expires_at <= now`
    async fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<RemovedTokens>;

    /// Remove revoked records with `updated_at <= cutoff`
    async fn delete_revoked_before(&self, cutoff: DateTime<Utc>) -> AuthResult<RemovedTokens>;

    async fn statistics(&self, now: DateTime<Utc>) -> AuthResult<TokenStatistics>;
}

/// In-memory token store
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    records: RwLock<HashMap<Uuid, TokenRecord>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn remove_where<F>(&self, predicate: F) -> RemovedTokens
    where
        F: Fn(&TokenRecord) -> bool + Send,
    {
        let mut removed = RemovedTokens::default();
        let mut records = self.records.write().await;
        records.retain(|_, record| {
            if predicate(record) {
                removed.count(record.token_type);
                false
            } else {
                true
            }
        });
        removed
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn insert(&self, record: TokenRecord) -> AuthResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.jti) {
            return Err(AuthError::conflict(format!(
                "Token record {} already exists",
                record.jti
            )));
        }
        records.insert(record.jti, record);
        Ok(())
    }

    async fn get(&self, jti: Uuid) -> AuthResult<Option<TokenRecord>> {
        Ok(self.records.read().await.get(&jti).cloned())
    }

    async fn touch(&self, jti: Uuid, at: DateTime<Utc>) -> AuthResult<()> {
        if let Some(record) = self.records.write().await.get_mut(&jti) {
            record.last_used_at = Some(at);
        }
        Ok(())
    }

    async fn revoke(&self, jti: Uuid, at: DateTime<Utc>) -> AuthResult<RevokeOutcome> {
        let mut records = self.records.write().await;
        let outcome = match records.get_mut(&jti) {
            None => RevokeOutcome::Missing,
            Some(record) if record.revoked => RevokeOutcome::AlreadyRevoked,
            Some(record) => {
                let before = record.clone();
                record.revoked = true;
                record.updated_at = at;
                RevokeOutcome::Revoked(before)
            }
        };
        Ok(outcome)
    }

    async fn consume(&self, jti: Uuid, at: DateTime<Utc>) -> AuthResult<RevokeOutcome> {
        let mut records = self.records.write().await;
        let outcome = match records.get_mut(&jti) {
            None => RevokeOutcome::Missing,
            Some(record) if record.revoked => RevokeOutcome::AlreadyRevoked,
            Some(record) if record.is_expired_at(at) => RevokeOutcome::Expired,
            Some(record) => {
                let before = record.clone();
                record.revoked = true;
                record.updated_at = at;
                RevokeOutcome::Revoked(before)
            }
        };
        Ok(outcome)
    }

    async fn revoke_all_for_user(&self, user_id: Uuid, at: DateTime<Utc>) -> AuthResult<usize> {
        let mut records = self.records.write().await;
        let mut revoked = 0;
        for record in records.values_mut() {
            if record.user_id == user_id && !record.revoked {
                record.revoked = true;
                record.updated_at = at;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> AuthResult<usize> {
        Ok(self
            .remove_where(|record| record.user_id == user_id)
            .await
            .total())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<RemovedTokens> {
        Ok(self.remove_where(|record| record.is_expired_at(now)).await)
    }

    async fn delete_revoked_before(&self, cutoff: DateTime<Utc>) -> AuthResult<RemovedTokens> {
        Ok(self
            .remove_where(|record| record.revoked && record.updated_at <= cutoff)
            .await)
    }

    async fn statistics(&self, now: DateTime<Utc>) -> AuthResult<TokenStatistics> {
        let records = self.records.read().await;
        let mut access_tokens = TokenCounts::default();
        let mut refresh_tokens = TokenCounts::default();

        for record in records.values() {
            match record.token_type {
                TokenType::Access => access_tokens.record(record, now),
                TokenType::Refresh => refresh_tokens.record(record, now),
            }
        }

        Ok(TokenStatistics {
            access_tokens,
            refresh_tokens,
            generated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(user_id: Uuid, token_type: TokenType, now: DateTime<Utc>, ttl: Duration) -> TokenRecord {
        TokenRecord::new(Uuid::new_v4(), user_id, token_type, now + ttl, now)
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_jti() {
        let store = InMemoryTokenStore::new();
        let now = Utc::now();
        let record = record(Uuid::new_v4(), TokenType::Access, now, Duration::hours(1));

        store.insert(record.clone()).await.unwrap();
        let result = store.insert(record).await;
        assert!(matches!(result, Err(AuthError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let store = InMemoryTokenStore::new();
        let now = Utc::now();
        let record = record(Uuid::new_v4(), TokenType::Refresh, now, Duration::days(7));
        store.insert(record.clone()).await.unwrap();

        let later = now + Duration::minutes(5);
        assert!(matches!(
            store.revoke(record.jti, later).await.unwrap(),
            RevokeOutcome::Revoked(_)
        ));
        assert_eq!(
            store.revoke(record.jti, later).await.unwrap(),
            RevokeOutcome::AlreadyRevoked
        );
        assert_eq!(
            store.revoke(Uuid::new_v4(), later).await.unwrap(),
            RevokeOutcome::Missing
        );

        let stored = store.get(record.jti).await.unwrap().unwrap();
        assert!(stored.revoked);
        assert_eq!(stored.updated_at, later);
    }

    #[tokio::test]
    async fn test_consume_refuses_expired_records() {
        let store = InMemoryTokenStore::new();
        let now = Utc::now();
        let record = record(Uuid::new_v4(), TokenType::Refresh, now, Duration::hours(1));
        store.insert(record.clone()).await.unwrap();

        assert_eq!(
            store
                .consume(record.jti, now + Duration::hours(2))
                .await
                .unwrap(),
            RevokeOutcome::Expired
        );
        assert!(!store.get(record.jti).await.unwrap().unwrap().revoked);

        // Revoke ignores expiry
        assert!(matches!(
            store
                .revoke(record.jti, now + Duration::hours(2))
                .await
                .unwrap(),
            RevokeOutcome::Revoked(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_expired_and_revoked() {
        let store = InMemoryTokenStore::new();
        let now = Utc::now();
        let user_id = Uuid::new_v4();

        let expired = record(user_id, TokenType::Access, now, Duration::seconds(-1));
        let live = record(user_id, TokenType::Access, now, Duration::hours(1));
        let old_revoked = record(user_id, TokenType::Refresh, now, Duration::days(7));
        for r in [&expired, &live, &old_revoked] {
            store.insert(r.clone()).await.unwrap();
        }
        store
            .revoke(old_revoked.jti, now - Duration::days(31))
            .await
            .unwrap();

        let removed = store.delete_expired(now).await.unwrap();
        assert_eq!(removed, RemovedTokens { access: 1, refresh: 0 });

        let removed = store
            .delete_revoked_before(now - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(removed, RemovedTokens { access: 0, refresh: 1 });

        assert_eq!(store.len().await, 1);
        assert!(store.get(live.jti).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_user_wide_operations() {
        let store = InMemoryTokenStore::new();
        let now = Utc::now();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store
            .insert(record(alice, TokenType::Access, now, Duration::hours(1)))
            .await
            .unwrap();
        store
            .insert(record(alice, TokenType::Refresh, now, Duration::days(7)))
            .await
            .unwrap();
        store
            .insert(record(bob, TokenType::Access, now, Duration::hours(1)))
            .await
            .unwrap();

        assert_eq!(store.revoke_all_for_user(alice, now).await.unwrap(), 2);
        assert_eq!(store.revoke_all_for_user(alice, now).await.unwrap(), 0);

        let stats = store.statistics(now).await.unwrap();
        assert_eq!(stats.access_tokens.revoked, 1);
        assert_eq!(stats.access_tokens.active, 1);
        assert_eq!(stats.refresh_tokens.revoked, 1);

        assert_eq!(store.delete_all_for_user(alice).await.unwrap(), 2);
        assert_eq!(store.len().await, 1);
    }
}
