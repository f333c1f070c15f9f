//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::BookstoreConfig;
use crate::services::auth::JwtKeys;

/// Handler state: configuration, the pool, and the JWT keys derived from
/// the configured secret. Cloning copies an `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BookstoreConfig,
    pool: PgPool,
    keys: JwtKeys,
}

impl AppState {
    /// Derives the JWT keys from `config.jwt`.
    #[must_use]
    pub fn new(config: BookstoreConfig, pool: PgPool) -> Self {
        let keys = JwtKeys::new(&config.jwt);

        Self {
            inner: Arc::new(AppStateInner { config, pool, keys }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BookstoreConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn keys(&self) -> &JwtKeys {
        &self.inner.keys
    }
}
