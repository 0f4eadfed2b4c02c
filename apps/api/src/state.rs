//! Shared application state.

use std::sync::Arc;

use saori_db::Database;

use crate::auth::JwtManager;
use crate::config::ApiConfig;

/// Built once in `main` and cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, jwt: JwtManager, config: ApiConfig) -> Self {
        AppState {
            db,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }
}
