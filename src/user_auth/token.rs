//! JWT issuance and validation
//!
//! Access and refresh tokens are HS256 JWTs. Every token carries a random
//! `jti` used as the revocation key. Tokens are otherwise stateless: the
//! revocation check happens in the middleware, not here.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::error::AuthError;
use crate::config::AuthConfig;
use crate::models::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Access => f.write_str("access"),
            TokenType::Refresh => f.write_str("refresh"),
        }
    }
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // user id
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Set only on access tokens minted by a password login
    pub fresh: bool,
    pub is_admin: bool,
}

impl Claims {
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub
            .parse::<UserId>()
            .map_err(|_| AuthError::InvalidToken("subject is not a user id".to_string()))
    }

    pub fn require_fresh(&self) -> Result<(), AuthError> {
        if self.fresh {
            Ok(())
        } else {
            Err(AuthError::FreshTokenRequired)
        }
    }

    pub fn require_admin(&self) -> Result<(), AuthError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AuthError::AdminRequired)
        }
    }
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl: Duration::seconds(access_ttl_secs),
            refresh_ttl: Duration::seconds(refresh_ttl_secs),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            config.access_ttl_secs,
            config.refresh_ttl_secs,
        )
    }

    pub fn issue_access(&self, user_id: UserId, fresh: bool, admin: bool) -> Result<String, AuthError> {
        self.issue(user_id, TokenType::Access, fresh, admin, self.access_ttl)
    }

    pub fn issue_refresh(&self, user_id: UserId, admin: bool) -> Result<String, AuthError> {
        self.issue(user_id, TokenType::Refresh, false, admin, self.refresh_ttl)
    }

    /// Verify signature and expiry, return the claims
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// Decode and insist on a token type
    pub fn decode_as(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let claims = self.decode(token)?;
        if claims.token_type != expected {
            return Err(AuthError::WrongTokenType { expected });
        }
        Ok(claims)
    }

    /// New non-fresh access token for the subject of a refresh token
    pub fn refresh_access(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.decode_as(refresh_token, TokenType::Refresh)?;
        self.access_from_refresh(&claims)
    }

    /// Same as [`Self::refresh_access`] for claims already decoded upstream
    pub fn access_from_refresh(&self, refresh: &Claims) -> Result<String, AuthError> {
        if refresh.token_type != TokenType::Refresh {
            return Err(AuthError::WrongTokenType {
                expected: TokenType::Refresh,
            });
        }
        self.issue_access(refresh.user_id()?, false, refresh.is_admin)
    }

    fn issue(
        &self,
        user_id: UserId,
        token_type: TokenType,
        fresh: bool,
        admin: bool,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type,
            fresh,
            is_admin: admin,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Encoding(e.to_string()))
    }
}

/// Strip the `Bearer ` scheme from an Authorization header value
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
