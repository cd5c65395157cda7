//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Authentication middleware for HTTP requests

use axum::extract::Request;
use axum::{
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::auth::{AuthError, AuthManager};
use crate::config::ACCESS_TOKEN_COOKIE;
use crate::guard::{self, PermissionRequirement};
use crate::users::User;

/// Extract an access token from a request
///
/// A `Bearer` authorization header wins over the `access_token` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        if let Some(token) = auth_value.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    cookie_value(headers, ACCESS_TOKEN_COOKIE)
}

/// Value of a named cookie, if present
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// User resolved by [`enforce`], available to downstream handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

/// What a guarded route demands of its caller
#[derive(Debug, Clone)]
pub enum GuardPolicy {
    /// Any active user with a valid access token
    Authenticated,

    /// A specific (feature, action) pair
    Permission(PermissionRequirement),

    /// The admin role
    Admin,
}

/// Guard state for [`enforce`]
#[derive(Debug, Clone)]
pub struct RouteGuard {
    auth: Arc<AuthManager>,
    policy: GuardPolicy,
}

impl RouteGuard {
    pub fn authenticated(auth: Arc<AuthManager>) -> Self {
        Self {
            auth,
            policy: GuardPolicy::Authenticated,
        }
    }

    pub fn permission(auth: Arc<AuthManager>, requirement: PermissionRequirement) -> Self {
        Self {
            auth,
            policy: GuardPolicy::Permission(requirement),
        }
    }

    pub fn admin(auth: Arc<AuthManager>) -> Self {
        Self {
            auth,
            policy: GuardPolicy::Admin,
        }
    }

    pub fn policy(&self) -> &GuardPolicy {
        &self.policy
    }

    /// Run the policy against request headers
    pub async fn check(&self, headers: &HeaderMap) -> Result<User, AuthError> {
        let token = extract_token(headers);
        let token = token.as_deref();

        match &self.policy {
            GuardPolicy::Authenticated => guard::authenticate(&self.auth, token).await,
            GuardPolicy::Permission(requirement) => requirement.check(&self.auth, token).await,
            GuardPolicy::Admin => guard::require_admin(&self.auth, token).await,
        }
    }
}

/// Guard middleware
///
/// Use with `axum::middleware::from_fn_with_state`. Rejects with 401 or 403
/// and otherwise stores an [`AuthenticatedUser`] in the request extensions.
pub async fn enforce(
    State(guard): State<RouteGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    match guard.check(request.headers()).await {
        Ok(user) => {
            debug!(user_id = %user.id, policy = ?guard.policy, "Request authorized");
            request.extensions_mut().insert(AuthenticatedUser(user));
            Ok(next.run(request).await)
        }
        Err(AuthError::NotAuthorized(_)) => Err(StatusCode::FORBIDDEN),
        Err(AuthError::NotAuthenticated(_)) => Err(StatusCode::UNAUTHORIZED),
        Err(e) => {
            tracing::error!("Guard failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::guard::require;
    use axum::{body::Body, http::HeaderValue, middleware, routing::get, Router};
    use tower::ServiceExt;

    const PASSWORD: &str = "Middlew4reOk";

    async fn auth_manager() -> Arc<AuthManager> {
        let mut config = AuthConfig::default();
        config.jwt.secret = "middleware-test-secret".to_string();
        config.users.password_hash_memory_kib = 64;
        config.users.password_hash_rounds = 1;
        Arc::new(AuthManager::new(config).await.unwrap())
    }

    async fn whoami(AuthenticatedUser(user): AuthenticatedUser) -> String {
        user.email
    }

    fn app(guard: RouteGuard) -> Router {
        Router::new()
            .route("/", get(whoami))
            .layer(middleware::from_fn_with_state(guard, enforce))
    }

    fn request(token: Option<&str>) -> axum::http::Request<Body> {
        let mut builder = axum::http::Request::builder().uri("/");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_extract_token_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; access_token=from-cookie"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("from-header"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("refresh_token=abc; access_token="),
        );
        assert_eq!(cookie_value(&headers, "refresh_token").as_deref(), Some("abc"));
        assert_eq!(cookie_value(&headers, "access_token"), None);
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[tokio::test]
    async fn test_enforce_status_codes() {
        let auth = auth_manager().await;
        let user = auth
            .create_user("http@example.com", PASSWORD, "User", None)
            .await
            .unwrap();
        auth.grant_permission(user.id, "todo_items", "read", None)
            .await
            .unwrap();
        let pair = auth.login("http@example.com", PASSWORD).await.unwrap();

        let readable = app(RouteGuard::permission(
            auth.clone(),
            require("todo_items", "read"),
        ));
        let response = readable
            .clone()
            .oneshot(request(Some(&pair.access_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = readable.oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let deletable = app(RouteGuard::permission(
            auth.clone(),
            require("todo_items", "delete"),
        ));
        let response = deletable
            .oneshot(request(Some(&pair.access_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let admin_only = app(RouteGuard::admin(auth.clone()));
        let response = admin_only
            .oneshot(request(Some(&pair.access_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let any_user = app(RouteGuard::authenticated(auth.clone()));
        let response = any_user
            .oneshot(request(Some("garbage")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_authenticated_user_reaches_handler() {
        let auth = auth_manager().await;
        auth.create_user("handler@example.com", PASSWORD, "User", None)
            .await
            .unwrap();
        let pair = auth.login("handler@example.com", PASSWORD).await.unwrap();

        let request = axum::http::Request::builder()
            .uri("/")
            .header(
                header::COOKIE,
                format!("{}={}", ACCESS_TOKEN_COOKIE, pair.access_token),
            )
            .body(Body::empty())
            .unwrap();
        let response = app(RouteGuard::authenticated(auth))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"handler@example.com");
    }
}
