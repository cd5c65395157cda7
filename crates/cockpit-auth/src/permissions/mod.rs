//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Permission grants and resolution

pub mod manager;
pub mod model;
pub mod resolver;
pub mod stats;

// Re-export commonly used types
pub use manager::PermissionManager;
pub use model::{PermissionKey, UserPermission};
pub use resolver::PermissionResolver;
pub use stats::PermissionStats;
