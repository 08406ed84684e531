//! Application state shared across handlers

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::{
    config::AppConfig,
    repositories::{RecipeRepository, SessionRepository, UserRepository},
    session::SessionManager,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Arc<AppConfig>,
    pub user_repository: UserRepository,
    pub recipe_repository: RecipeRepository,
    pub sessions: SessionManager,
}

impl AppState {
    /// Wire the repositories and the session manager onto one pool
    pub fn new(db_pool: SqlitePool, config: AppConfig) -> Self {
        let sessions = SessionManager::new(
            SessionRepository::new(db_pool.clone()),
            config.session_ttl_secs,
            config.secure_cookies,
        );

        Self {
            user_repository: UserRepository::new(db_pool.clone()),
            recipe_repository: RecipeRepository::new(db_pool.clone()),
            sessions,
            config: Arc::new(config),
            db_pool,
        }
    }
}
