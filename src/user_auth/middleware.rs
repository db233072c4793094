use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::error::AuthError;
use super::token::{Claims, TokenType, extract_bearer_token};
use crate::gateway::{error::ApiError, state::AppState};

/// Resource routes: valid, unrevoked access token
pub async fn require_access_token(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(&state, request, next, TokenType::Access).await
}

/// `/refresh`: valid, unrevoked refresh token
pub async fn require_refresh_token(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(&state, request, next, TokenType::Refresh).await
}

async fn authorize(
    state: &AppState,
    mut request: Request<Body>,
    next: Next,
    expected: TokenType,
) -> Result<Response, ApiError> {
    let claims = match bearer_claims(state, &request, expected) {
        Ok(claims) => claims,
        Err(e) => {
            if e.is_unauthorized() {
                tracing::warn!(
                    method = %request.method(),
                    path = %request.uri().path(),
                    "Rejected request: {}",
                    e
                );
            } else {
                tracing::error!(path = %request.uri().path(), "Auth check failed: {}", e);
            }
            return Err(e.into());
        }
    };

    // Inject claims for handlers
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

fn bearer_claims(
    state: &AppState,
    request: &Request<Body>,
    expected: TokenType,
) -> Result<Claims, AuthError> {
    // 1. Extract Authorization header
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    // 2. Bearer scheme
    let token = extract_bearer_token(auth_header).ok_or(AuthError::InvalidFormat)?;

    // 3. Signature, expiry, type, revocation
    state.user_auth.authenticate(token, expected)
}
