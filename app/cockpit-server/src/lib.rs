//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! HTTP surface for the Cockpit authorization core
//!
//! Exposes the session endpoints (login, refresh, logout, me), per-user
//! permission administration and admin token maintenance. Every protected
//! route is wrapped in a [`cockpit_auth::RouteGuard`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod server;
pub mod state;

// Re-export commonly used types
pub use config::{BootstrapAdmin, ServerConfig};
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use server::{bootstrap_admin, create_router, serve, shutdown_signal};
pub use state::AppState;

/// Server version
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
