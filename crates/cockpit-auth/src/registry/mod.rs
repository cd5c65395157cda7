//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Role, feature and action registry

pub mod manager;
pub mod model;
pub mod stats;

// Re-export commonly used types
pub use manager::Registry;
pub use model::{Action, Feature, Permission, Role};
pub use stats::RegistryStats;
