//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Error handling for the Cockpit API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cockpit_auth::AuthError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ApiError {
    /// Get HTTP status code for the error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for the error
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Get error message
    pub fn message(&self) -> String {
        match self {
            ApiError::Internal(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Validation(msg)
            | ApiError::Configuration(msg) => msg.clone(),
        }
    }
}

/// Error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code
    pub code: String,

    /// Error message
    pub message: String,

    /// Timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: &ApiError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.message(),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            error!("Request failed: {}", self);
        }

        (status_code, Json(ErrorResponse::new(&self))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(_)
            | AuthError::Expired(_)
            | AuthError::Revoked(_)
            | AuthError::NotAuthenticated(_) => {
                ApiError::Unauthorized("Could not validate credentials".to_string())
            }
            AuthError::InvalidCredentials(_) => {
                ApiError::Unauthorized("Incorrect email or password".to_string())
            }
            AuthError::UserInactive(_) => ApiError::Unauthorized("Inactive user".to_string()),
            AuthError::NotAuthorized(msg) => ApiError::Forbidden(msg),
            AuthError::UnknownRegistryEntry(msg) => ApiError::NotFound(msg),
            AuthError::UserNotFound(msg) => ApiError::NotFound(format!("User {}", msg)),
            AuthError::Conflict(msg) => ApiError::Conflict(msg),
            AuthError::Validation(msg) => ApiError::Validation(msg),
            AuthError::Configuration(msg) => ApiError::Configuration(msg),
            AuthError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Internal(format!("IO error: {}", err))
    }
}

impl From<toml::de::Error> for ApiError {
    fn from(err: toml::de::Error) -> Self {
        ApiError::Configuration(format!("Invalid configuration file: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_status_mapping() {
        let cases = [
            (AuthError::expired("jti"), StatusCode::UNAUTHORIZED),
            (AuthError::revoked("jti"), StatusCode::UNAUTHORIZED),
            (AuthError::not_authenticated("x"), StatusCode::UNAUTHORIZED),
            (AuthError::invalid_credentials("x"), StatusCode::UNAUTHORIZED),
            (AuthError::user_inactive("x"), StatusCode::UNAUTHORIZED),
            (AuthError::not_authorized("x"), StatusCode::FORBIDDEN),
            (AuthError::conflict("x"), StatusCode::CONFLICT),
            (AuthError::validation("x"), StatusCode::BAD_REQUEST),
            (AuthError::unknown_registry_entry("x"), StatusCode::NOT_FOUND),
            (AuthError::user_not_found("x"), StatusCode::NOT_FOUND),
            (AuthError::internal("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (auth_error, status) in cases {
            assert_eq!(ApiError::from(auth_error).status_code(), status);
        }
    }

    #[test]
    fn test_token_errors_share_one_message() {
        let expired = ApiError::from(AuthError::expired("a"));
        let revoked = ApiError::from(AuthError::revoked("b"));
        assert_eq!(expired.message(), revoked.message());
    }

    #[test]
    fn test_error_response_body() {
        let error = ApiError::Conflict("Permission already granted".to_string());
        let body = serde_json::to_value(ErrorResponse::new(&error)).unwrap();
        assert_eq!(body["code"], "CONFLICT");
        assert_eq!(body["message"], "Permission already granted");
        assert!(body["timestamp"].is_string());
    }
}
