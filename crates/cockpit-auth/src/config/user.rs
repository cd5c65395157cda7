//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Password policy and hashing cost

use serde::{Deserialize, Serialize};

use crate::{AuthError, AuthResult};

/// Argon2 requires at least 8 KiB per lane; hashing uses one lane.
const MIN_HASH_MEMORY_KIB: u32 = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Counted in characters, not bytes
    pub min_password_length: usize,

    pub password_complexity: PasswordComplexity,

    /// Argon2 time cost (iterations)
    pub password_hash_rounds: u32,

    /// Argon2 memory cost in KiB
    pub password_hash_memory_kib: u32,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            min_password_length: 8,
            password_complexity: PasswordComplexity::default(),
            password_hash_rounds: crate::DEFAULT_PASSWORD_HASH_ROUNDS,
            password_hash_memory_kib: crate::DEFAULT_PASSWORD_HASH_MEMORY_KIB,
        }
    }
}

impl UserConfig {
    pub fn validate(&self) -> AuthResult<()> {
        if self.min_password_length == 0 {
            return Err(AuthError::configuration(
                "Minimum password length must be greater than zero",
            ));
        }

        if self.password_hash_rounds == 0 {
            return Err(AuthError::configuration(
                "Password hash rounds must be greater than zero",
            ));
        }

        if self.password_hash_memory_kib < MIN_HASH_MEMORY_KIB {
            return Err(AuthError::configuration(format!(
                "Password hash memory must be at least {} KiB",
                MIN_HASH_MEMORY_KIB
            )));
        }

        Ok(())
    }

    /// First policy rule the password breaks, if any
    pub fn password_violation(&self, password: &str) -> Option<String> {
        if password.chars().count() < self.min_password_length {
            return Some(format!(
                "Password must be at least {} characters long",
                self.min_password_length
            ));
        }

        self.password_complexity
            .missing_class(password)
            .map(|class| format!("Password must contain {}", class))
    }
}

/// Character classes a password must include
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordComplexity {
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_numbers: bool,

    /// Anything that is not alphanumeric
    pub require_special: bool,
}

impl Default for PasswordComplexity {
    fn default() -> Self {
        Self {
            require_uppercase: true,
            require_lowercase: true,
            require_numbers: true,
            require_special: false,
        }
    }
}

impl PasswordComplexity {
    fn missing_class(&self, password: &str) -> Option<&'static str> {
        let rules: [(bool, fn(char) -> bool, &'static str); 4] = [
            (self.require_uppercase, char::is_uppercase, "uppercase letters"),
            (self.require_lowercase, char::is_lowercase, "lowercase letters"),
            (self.require_numbers, char::is_numeric, "numbers"),
            (self.require_special, |c| !c.is_alphanumeric(), "special characters"),
        ];

        rules
            .into_iter()
            .find(|(required, matches, _)| *required && !password.chars().any(*matches))
            .map(|(_, _, class)| class)
    }
}
