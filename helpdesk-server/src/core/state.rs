//! Application state

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::attachments::AttachmentStore;
use crate::auth::rate_limit::RateLimiter;
use crate::auth::session::SessionStore;
use crate::core::config::{BoxError, Config};
use crate::db::DbService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection pool
    pub pool: SqlitePool,
    /// Attachment directory
    pub attachments: AttachmentStore,
    /// Server-side sessions keyed by cookie token
    pub sessions: SessionStore,
    /// Rate limiter for the login route
    pub rate_limiter: RateLimiter,
    pub config: Arc<Config>,
}

impl AppState {
    /// Open the database, apply migrations and prepare the upload directory
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let db = DbService::new(&config.database_path).await?;
        let attachments = AttachmentStore::new(&config.upload_dir, config.max_upload_bytes)?;

        Ok(Self::from_parts(db.pool, attachments, config.clone()))
    }

    /// Assemble state from already-prepared parts
    pub fn from_parts(pool: SqlitePool, attachments: AttachmentStore, config: Config) -> Self {
        Self {
            pool,
            attachments,
            sessions: SessionStore::new(config.session_max_age_secs),
            rate_limiter: RateLimiter::new(),
            config: Arc::new(config),
        }
    }
}

#[cfg(test)]
impl AppState {
    /// In-memory database and an upload directory under `upload_dir`
    pub(crate) async fn for_tests(upload_dir: &std::path::Path, config: Config) -> Self {
        let pool = crate::db::test_pool().await;
        let attachments = AttachmentStore::new(upload_dir, config.max_upload_bytes).unwrap();
        Self::from_parts(pool, attachments, config)
    }
}
