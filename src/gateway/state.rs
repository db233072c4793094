use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::DataStore;
use crate::user_auth::{RevocationStore, TokenService, UserAuthService};

/// Gateway application state (shared)
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend (Postgres or in-memory)
    pub store: Arc<dyn DataStore>,
    /// Registration, login and token checks
    pub user_auth: Arc<UserAuthService>,
    /// Revoked token ids, swept by a background task while the server runs
    pub revocations: Arc<RevocationStore>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DataStore>,
        user_auth: Arc<UserAuthService>,
        revocations: Arc<RevocationStore>,
    ) -> Self {
        Self {
            store,
            user_auth,
            revocations,
        }
    }

    /// Wire the auth services around `store` from configuration
    pub fn from_config(config: &AppConfig, store: Arc<dyn DataStore>) -> Self {
        let revocations = Arc::new(RevocationStore::new());
        let tokens = Arc::new(TokenService::from_config(&config.auth));
        let user_auth = Arc::new(UserAuthService::new(
            store.clone(),
            tokens,
            revocations.clone(),
            config.auth.admin_user_ids.clone(),
        ));
        Self::new(store, user_auth, revocations)
    }
}
