use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::error::AuthError;
use super::password::{hash_password, verify_password};
use super::revocation::RevocationStore;
use super::token::{Claims, TokenService, TokenType};
use crate::models::{User, UserId};
use crate::store::{DataStore, StoreError};

/// Login response
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Registration, login and session bookkeeping on top of the data store
pub struct UserAuthService {
    store: Arc<dyn DataStore>,
    tokens: Arc<TokenService>,
    revocations: Arc<RevocationStore>,
    admin_user_ids: Vec<UserId>,
}

impl UserAuthService {
    pub fn new(
        store: Arc<dyn DataStore>,
        tokens: Arc<TokenService>,
        revocations: Arc<RevocationStore>,
        admin_user_ids: Vec<UserId>,
    ) -> Self {
        Self {
            store,
            tokens,
            revocations,
            admin_user_ids,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.admin_user_ids.contains(&user_id)
    }

    /// Register a new user
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        if self.store.find_user_by_username(username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = hash_password(password)?;
        match self.store.create_user(username, &password_hash).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, "User registered");
                Ok(user)
            }
            // lost a race with a concurrent registration
            Err(StoreError::Conflict(_)) => Err(AuthError::UsernameTaken),
            Err(e) => Err(e.into()),
        }
    }

    /// Verify credentials and issue a fresh access token plus a refresh token
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = self
            .store
            .find_user_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let admin = self.is_admin(user.id);
        let pair = TokenPair {
            access_token: self.tokens.issue_access(user.id, true, admin)?,
            refresh_token: self.tokens.issue_refresh(user.id, admin)?,
        };
        tracing::info!(user_id = user.id, admin, "User logged in");
        Ok(pair)
    }

    /// Decode a bearer token and reject revoked or mistyped ones
    pub fn authenticate(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let claims = self.tokens.decode_as(token, expected)?;
        if self.revocations.is_revoked(&claims.jti) {
            return Err(AuthError::Revoked);
        }
        Ok(claims)
    }

    /// Non-fresh access token from validated refresh claims
    pub fn refresh(&self, claims: &Claims) -> Result<String, AuthError> {
        self.tokens.access_from_refresh(claims)
    }

    /// Revoke the presented token
    pub fn logout(&self, claims: &Claims) {
        self.revocations.revoke(&claims.jti, claims.exp);
        tracing::info!(sub = %claims.sub, jti = %claims.jti, "Token revoked");
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::Store(StoreError::NotFound("User")))
    }

    pub async fn delete_user(&self, user_id: UserId) -> Result<(), AuthError> {
        self.store.delete_user(user_id).await?;
        tracing::info!(user_id, "User deleted");
        Ok(())
    }
}
