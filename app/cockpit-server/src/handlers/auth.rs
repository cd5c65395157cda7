//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Session endpoints
//!
//! Every endpoint that hands out tokens also sets them as cookies, and
//! logout always clears them again.

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::{AppendHeaders, IntoResponse, Response},
    Json,
};
use cockpit_auth::config::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use cockpit_auth::middleware::cookie_value;
use cockpit_auth::{extract_token, AuthenticatedUser, TokenPair, User};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Login request body
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password change request body
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Refresh request body; the cookie is used when the token is absent
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Current user with their effective permissions
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub role: Option<String>,
    pub is_admin: bool,
    pub permissions: Vec<String>,
}

fn with_session_cookies(state: &AppState, pair: TokenPair) -> impl IntoResponse {
    let config = state.auth.config();
    let cookies = [
        (SET_COOKIE, config.access_token_cookie(&pair.access_token)),
        (SET_COOKIE, config.refresh_token_cookie(&pair.refresh_token)),
    ];
    (AppendHeaders(cookies), Json(pair))
}

/// Exchange credentials for a token pair
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let pair = state.auth.login(&request.email, &request.password).await?;
    Ok(with_session_cookies(&state, pair))
}

/// Rotate a refresh token
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<impl IntoResponse> {
    let refresh_token = body
        .and_then(|Json(request)| request.refresh_token)
        .filter(|token| !token.is_empty())
        .or_else(|| cookie_value(&headers, REFRESH_TOKEN_COOKIE))
        .ok_or_else(|| ApiError::Unauthorized("Refresh token required".to_string()))?;

    let pair = state.auth.refresh(&refresh_token).await?;
    Ok(with_session_cookies(&state, pair))
}

/// Revoke the session tokens and clear the cookies
///
/// The cookies are cleared on every outcome, including a rejected access
/// token.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let refresh_token = cookie_value(&headers, REFRESH_TOKEN_COOKIE);
    let result = match extract_token(&headers) {
        Some(access_token) => state
            .auth
            .logout(&access_token, refresh_token.as_deref())
            .await
            .map_err(ApiError::from),
        None => Err(ApiError::Unauthorized(
            "Could not validate credentials".to_string(),
        )),
    };

    let cookies = &state.auth.config().cookies;
    let cleared = AppendHeaders([
        (SET_COOKIE, cookies.clear(ACCESS_TOKEN_COOKIE)),
        (SET_COOKIE, cookies.clear(REFRESH_TOKEN_COOKIE)),
    ]);

    match result {
        Ok(_) => {
            info!("Session logged out");
            (cleared, Json(json!({ "message": "Successfully logged out" }))).into_response()
        }
        Err(e) => {
            warn!("Logout rejected, clearing cookies anyway: {}", e);
            (cleared, e).into_response()
        }
    }
}

/// Replace the caller's password
///
/// Every other session of the caller ends; the response carries a fresh
/// pair for this one.
pub async fn change_password(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    let pair = state
        .auth
        .change_password(user.id, &request.current_password, &request.new_password)
        .await?;
    info!("Password changed for user {}", user.email);
    Ok(with_session_cookies(&state, pair))
}

/// Describe the authenticated caller
pub async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> ApiResult<Json<MeResponse>> {
    let role = state
        .auth
        .registry()
        .role_by_id(user.role_id)
        .await
        .map(|role| role.name);
    let is_admin = state.auth.resolver().is_admin(&user).await;
    let permissions = state
        .auth
        .user_permissions(user.id)
        .await?
        .into_iter()
        .map(|key| key.to_string())
        .collect();

    Ok(Json(MeResponse {
        user,
        role,
        is_admin,
        permissions,
    }))
}
