//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Registry statistics

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Registry statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistryStats {
    /// Number of registered roles
    pub roles: usize,

    /// Number of registered features
    pub features: usize,

    /// Number of registered actions
    pub actions: usize,

    /// Number of registered permissions
    pub permissions: usize,

    /// Last mutation of the registry
    pub last_modified: Option<DateTime<Utc>>,
}
