//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! HTTP request handlers

pub mod admin;
pub mod auth;
pub mod health;
pub mod permissions;
pub mod registry;

// Re-export commonly used types
pub use auth::{ChangePasswordRequest, LoginRequest, MeResponse, RefreshRequest};
pub use permissions::{GrantPermissionsRequest, UserPermissionsResponse};
