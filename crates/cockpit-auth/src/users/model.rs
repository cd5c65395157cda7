//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! User model definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User structure
#[derive(Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID
    pub id: Uuid,

    /// Email, trimmed and lowercased
    pub email: String,

    /// Argon2 PHC string
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Whether the user is active
    pub is_active: bool,

    /// Registry role
    pub role_id: Uuid,

    /// User that created this account
    pub created_by: Option<Uuid>,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Last modification time
    pub updated_at: DateTime<Utc>,

    /// Last successful login
    pub last_login_at: Option<DateTime<Utc>>,

    /// Set once the user replaced their initial password
    #[serde(default)]
    pub password_changed: bool,
}

impl User {
    /// Create new active user
    pub fn new(
        email: String,
        password_hash: String,
        role_id: Uuid,
        created_by: Option<Uuid>,
    ) -> Self {
        Self::new_at(email, password_hash, role_id, created_by, Utc::now())
    }

    /// Create new active user stamped with `now`
    pub fn new_at(
        email: String,
        password_hash: String,
        role_id: Uuid,
        created_by: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            is_active: true,
            role_id,
            created_by,
            created_at: now,
            updated_at: now,
            last_login_at: None,
            password_changed: false,
        }
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<sensitive>")
            .field("is_active", &self.is_active)
            .field("role_id", &self.role_id)
            .field("created_by", &self.created_by)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .field("last_login_at", &self.last_login_at)
            .field("password_changed", &self.password_changed)
            .finish()
    }
}

/// Normalize an email address for storage and lookup
pub fn normalize_email(email: &str) -> crate::AuthResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(crate::AuthError::validation(format!(
            "Invalid email address: {}",
            email
        ))),
    }
}
