use std::sync::Arc;

use crate::auth::SessionManager;
use crate::config::AppConfig;
use crate::services::{AuthService, UserService};
use crate::store::UserStore;

/// Shared, read-only per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: SessionManager,
    pub auth: AuthService,
    pub users: UserService,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn UserStore>) -> Self {
        let sessions = SessionManager::new(&config);
        let auth = AuthService::new(store.clone(), sessions.clone());
        let users = UserService::new(store, config.security.bcrypt_cost);

        Self {
            config: Arc::new(config),
            sessions,
            auth,
            users,
        }
    }
}
