//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Token maintenance endpoints

use axum::{extract::State, Json};
use cockpit_auth::{AuthenticatedUser, CleanupReport, TokenStatistics};
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;

/// Per-type token record counts
pub async fn token_stats(State(state): State<AppState>) -> ApiResult<Json<TokenStatistics>> {
    Ok(Json(state.auth.token_statistics().await?))
}

/// Run a token cleanup sweep now
pub async fn cleanup_tokens(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
) -> ApiResult<Json<CleanupReport>> {
    let report = state.auth.cleanup_expired_tokens().await?;
    info!(
        admin_id = %admin.id,
        removed = report.total_removed,
        "Manual token cleanup"
    );
    Ok(Json(report))
}
