//! Shared application state.

use std::sync::Arc;

use innkeep_db::Database;

use crate::auth::JwtManager;
use crate::config::ServerConfig;

/// Cloned into every handler; all fields are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        AppState {
            db,
            jwt: Arc::new(JwtManager::new(&config.jwt_secret)),
            config: Arc::new(config),
        }
    }
}
