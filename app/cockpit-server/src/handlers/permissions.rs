//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Per-user permission grant endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use cockpit_auth::permissions::UserPermission;
use cockpit_auth::{AuthenticatedUser, PermissionKey};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UserPermissionsResponse {
    pub user_id: Uuid,

    /// Effective (feature, action) pairs
    pub permissions: Vec<PermissionKey>,

    /// Explicit grants, oldest first
    pub grants: Vec<UserPermission>,
}

#[derive(Debug, Deserialize)]
pub struct GrantPermissionsRequest {
    pub permissions: Vec<PermissionKey>,
}

/// List a user's permissions
pub async fn list_user_permissions(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<UserPermissionsResponse>> {
    let permissions = state.auth.user_permissions(user_id).await?;
    let grants = state.auth.permission_manager().user_grants(user_id).await;

    Ok(Json(UserPermissionsResponse {
        user_id,
        permissions: permissions.into_iter().collect(),
        grants,
    }))
}

/// Grant permissions to a user, all or nothing
pub async fn grant_user_permissions(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<GrantPermissionsRequest>,
) -> ApiResult<(StatusCode, Json<Vec<UserPermission>>)> {
    if request.permissions.is_empty() {
        return Err(ApiError::Validation(
            "At least one permission is required".to_string(),
        ));
    }

    let granted = state
        .auth
        .grant_permissions(user_id, &request.permissions, Some(caller.id))
        .await?;
    Ok((StatusCode::CREATED, Json(granted)))
}

/// Remove one grant from a user
pub async fn revoke_user_permission(
    State(state): State<AppState>,
    Path((user_id, feature, action)): Path<(Uuid, String, String)>,
) -> ApiResult<StatusCode> {
    if state
        .auth
        .revoke_permission(user_id, &feature, &action)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!(
            "User {} has no grant for {}:{}",
            user_id, feature, action
        )))
    }
}
