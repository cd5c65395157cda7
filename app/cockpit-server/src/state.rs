//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Shared handler state

use cockpit_auth::AuthManager;
use std::sync::Arc;

/// Application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub auth: Arc<AuthManager>,
}

impl AppState {
    pub fn new(auth: Arc<AuthManager>) -> Self {
        Self { auth }
    }
}
