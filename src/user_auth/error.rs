//! Authentication error types

use thiserror::Error;

use super::token::TokenType;
use crate::store::StoreError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingToken,

    #[error("Invalid token format")]
    InvalidFormat,

    /// Bad signature, malformed payload or expired
    #[error("Invalid or expired token: {0}")]
    InvalidToken(String),

    #[error("Token has been revoked")]
    Revoked,

    #[error("Expected {expected} token")]
    WrongTokenType { expected: TokenType },

    #[error("Fresh token required")]
    FreshTokenRequired,

    #[error("Admin privilege required")]
    AdminRequired,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("A user with that username already exists.")]
    UsernameTaken,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token encoding failed: {0}")]
    Encoding(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Client-side failures that should answer 401
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::MissingToken
                | AuthError::InvalidFormat
                | AuthError::InvalidToken(_)
                | AuthError::Revoked
                | AuthError::WrongTokenType { .. }
                | AuthError::FreshTokenRequired
                | AuthError::InvalidCredentials
        )
    }
}
