//! HTTP boundary errors.
//!
//! Every handler returns [`ApiError`] on failure; lower layers convert into it
//! via `From`, so nothing escapes unmapped.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::types::{ApiResponse, error_codes};
use crate::store::StoreError;
use crate::user_auth::AuthError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Missing, invalid, revoked or stale token; bad credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but lacking the admin claim
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// Uniqueness or referential rule violated
    #[error("{0}")]
    Conflict(String),

    /// Duplicate account
    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    Persistence(String),

    #[error("{0}")]
    Internal(String),

    #[error("{0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn code(&self) -> i32 {
        match self {
            ApiError::Unauthorized(_) => error_codes::AUTH_FAILED,
            ApiError::Forbidden(_) => error_codes::PERMISSION_DENIED,
            ApiError::BadRequest(_) => error_codes::INVALID_PARAMETER,
            ApiError::NotFound(_) => error_codes::NOT_FOUND,
            ApiError::Conflict(_) => error_codes::CONFLICT,
            ApiError::AlreadyExists(_) => error_codes::ALREADY_EXISTS,
            ApiError::Persistence(_) => error_codes::PERSISTENCE_ERROR,
            ApiError::Internal(_) => error_codes::INTERNAL_ERROR,
            ApiError::ServiceUnavailable(_) => error_codes::SERVICE_UNAVAILABLE,
        }
    }

    /// Admin failures answer 401 rather than 403; clients of this API
    /// already branch on 401 for every privilege problem.
    pub fn http_status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) | ApiError::Forbidden(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AlreadyExists(_) => StatusCode::CONFLICT,
            ApiError::Persistence(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()>::error(self.code(), self.message());
        (self.http_status(), Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(entity) => ApiError::NotFound(format!("{} not found", entity)),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Database(detail) => {
                tracing::error!("Persistence failure: {}", detail);
                ApiError::Persistence("An error occurred while accessing the database".to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidToken(detail) => {
                tracing::debug!("Token rejected: {}", detail);
                ApiError::Unauthorized("Invalid or expired token".to_string())
            }
            AuthError::AdminRequired => ApiError::Forbidden(e.to_string()),
            AuthError::UsernameTaken => ApiError::AlreadyExists(e.to_string()),
            AuthError::Store(inner) => inner.into(),
            AuthError::Hashing(_) | AuthError::Encoding(_) => {
                tracing::error!("Auth internal failure: {}", e);
                ApiError::Internal("Authentication failed".to_string())
            }
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}
