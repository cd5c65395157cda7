//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Access and refresh token lifecycle
//!
//! Every issued JWT has a record keyed by its `jti`. A record moves from
//! issued through any number of uses to either expired or revoked, and never
//! back. Terminal records are removed by the cleanup sweep.

pub mod cleanup;
pub mod model;
pub mod service;
pub mod stats;
pub mod store;

// Re-export commonly used types
pub use cleanup::{TokenCleanupHandle, TokenCleanupTask};
pub use model::{
    CleanupReport, RemovedTokens, RevokeOutcome, TokenCounts, TokenPair, TokenRecord,
    TokenStatistics, ValidatedToken,
};
pub use service::TokenService;
pub use stats::TokenStats;
pub use store::{InMemoryTokenStore, TokenStore};
