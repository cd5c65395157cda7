//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Role and permission listing endpoints

use axum::{extract::State, Json};
use cockpit_auth::registry::{Permission, Role};
use cockpit_auth::AuthenticatedUser;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// List every role, ordered by name
pub async fn list_roles(State(state): State<AppState>) -> Json<Vec<Role>> {
    Json(state.auth.registry().roles().await)
}

/// Role of the authenticated caller
pub async fn my_role(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> ApiResult<Json<Role>> {
    state
        .auth
        .registry()
        .role_by_id(user.role_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Role {}", user.role_id)))
}

/// List every registered (feature, action) permission
pub async fn list_permissions(State(state): State<AppState>) -> Json<Vec<Permission>> {
    Json(state.auth.registry().permissions().await)
}
