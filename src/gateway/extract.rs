//! Request extraction with framework-level validation.
//!
//! Handlers taking [`ValidatedJson<T>`] never see a body that failed to parse
//! or failed `T::validate()`; both are answered with 400 before the handler
//! runs. [`ApiPath<T>`] does the same for path segments, so `/item/abc` gets
//! the JSON envelope like every other error.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use super::error::ApiError;

#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // 1. Parse JSON
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {}", e.body_text())))?;

        // 2. Field rules
        value
            .validate()
            .map_err(|e| ApiError::BadRequest(e.to_string().replace('\n', "; ")))?;

        Ok(ValidatedJson(value))
    }
}

#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid path: {}", e.body_text())))?;
        Ok(ApiPath(value))
    }
}
