//! Shared application state for all routes. The registry is frozen before serving and swapped whole.

use crate::auth::{Authenticator, PasswordHasher, SaltedSha256Hasher, SqliteUserStore};
use crate::config::AdminConfig;
use crate::error::AppError;
use crate::model::{InventorySource, Registry, RegistryHandle, ScanReport, Scanner};
use crate::render::{JsonRenderer, Renderer};
use crate::store::ensure_tables;
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub registry: RegistryHandle,
    pub auth: Authenticator,
    pub renderer: Arc<dyn Renderer>,
    pub cookie_key: Key,
    pub config: Arc<AdminConfig>,
}

impl AppState {
    /// State over an already-built registry, rendering with [`JsonRenderer`].
    pub fn new(
        pool: SqlitePool,
        registry: Arc<Registry>,
        auth: Authenticator,
        config: AdminConfig,
    ) -> Self {
        AppState {
            pool,
            registry: RegistryHandle::new(registry),
            auth: auth.with_insecure_cookie(config.insecure_cookie),
            renderer: Arc::new(JsonRenderer),
            cookie_key: config.cookie_key(),
            config: Arc::new(config),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Scan `config.discovery_roots`, create missing tables, and assemble state with the
    /// built-in user store.
    pub async fn build(pool: SqlitePool, config: AdminConfig) -> Result<(Self, ScanReport), AppError> {
        let hasher: Arc<dyn PasswordHasher> = Arc::new(SaltedSha256Hasher::new());
        Self::build_with_hasher(pool, config, hasher).await
    }

    pub async fn build_with_hasher(
        pool: SqlitePool,
        config: AdminConfig,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Result<(Self, ScanReport), AppError> {
        let users = SqliteUserStore::new(pool.clone());
        users.init_schema().await?;

        let mut registry = Registry::new();
        let report = Scanner::new(InventorySource::collect()).scan(&config.discovery_roots, &mut registry);
        ensure_tables(&pool, &registry).await?;

        let auth = Authenticator::new(Arc::new(users), hasher);
        Ok((Self::new(pool, registry.freeze(), auth, config), report))
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
