//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Router assembly and server lifecycle

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post, MethodRouter},
    Router,
};
use cockpit_auth::{enforce, init_auth_system, require, shutdown_auth_system, RouteGuard};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::handlers::{admin, auth, health, permissions, registry};
use crate::state::AppState;

fn guarded(route: MethodRouter<AppState>, guard: RouteGuard) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(guard, enforce))
}

/// Create the HTTP router
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let auth_manager = state.auth.clone();
    let authenticated = RouteGuard::authenticated(auth_manager.clone());
    let read_users = RouteGuard::permission(auth_manager.clone(), require("users", "read"));
    let update_users = RouteGuard::permission(auth_manager.clone(), require("users", "update"));
    let admin_only = RouteGuard::admin(auth_manager);

    let router = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", guarded(get(auth::me), authenticated.clone()))
        .route(
            "/api/auth/password",
            guarded(post(auth::change_password), authenticated.clone()),
        )
        .route(
            "/api/roles",
            guarded(get(registry::list_roles), admin_only.clone()),
        )
        .route("/api/roles/me", guarded(get(registry::my_role), authenticated))
        .route(
            "/api/permissions",
            guarded(get(registry::list_permissions), admin_only.clone()),
        )
        .route(
            "/api/users/:user_id/permissions",
            guarded(get(permissions::list_user_permissions), read_users).merge(guarded(
                post(permissions::grant_user_permissions),
                update_users.clone(),
            )),
        )
        .route(
            "/api/users/:user_id/permissions/:feature/:action",
            guarded(delete(permissions::revoke_user_permission), update_users),
        )
        .route(
            "/api/admin/tokens/stats",
            guarded(get(admin::token_stats), admin_only.clone()),
        )
        .route(
            "/api/admin/tokens/cleanup",
            guarded(post(admin::cleanup_tokens), admin_only),
        )
        .with_state(state);

    let router = match cors_layer(&config.cors_allowed_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}

/// Create the bootstrap admin if configured and missing
pub async fn bootstrap_admin(
    state: &AppState,
    config: &ServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Some(admin) = &config.bootstrap_admin else {
        return Ok(());
    };

    if state
        .auth
        .user_manager()
        .get_user_by_email(&admin.email)
        .await
        .is_some()
    {
        info!("Bootstrap admin {} already exists", admin.email);
        return Ok(());
    }

    let admin_role = state.auth.config().rbac.admin_role.clone();
    let user = state
        .auth
        .create_user(&admin.email, &admin.password, &admin_role, None)
        .await?;
    info!("Created bootstrap admin {}", user.email);
    Ok(())
}

/// Run the server until a shutdown signal arrives
pub async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Starting Cockpit server v{}", crate::SERVER_VERSION);

    let auth_manager = Arc::new(init_auth_system(config.auth.clone()).await?);
    let state = AppState::new(auth_manager.clone());
    bootstrap_admin(&state, &config).await?;

    let cleanup = auth_manager.spawn_cleanup_task();
    let app = create_router(state, &config);

    let listener = TcpListener::bind(&config.bind_address).await?;
    info!("HTTP server listening on {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(cleanup) = cleanup {
        cleanup.stop().await;
    }

    match Arc::try_unwrap(auth_manager) {
        Ok(auth_manager) => shutdown_auth_system(auth_manager).await?,
        Err(auth_manager) => auth_manager.shutdown().await?,
    }

    info!("Cockpit server shutdown completed");
    Ok(())
}

/// Handle shutdown signals
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }

    info!("Shutdown signal received");
}
