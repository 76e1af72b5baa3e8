//! Shared application state for all routes.

use crate::access::{AccessStore, PermissionCache, PgAccessStore, TenantAccess};
use crate::error::AppError;
use crate::model::Action;
use crate::settings::Settings;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Lookups used by the gate. Backed by `pool` unless replaced.
    pub access: Arc<dyn AccessStore>,
    pub permissions: PermissionCache,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(pool: PgPool, settings: Settings) -> Self {
        AppState {
            access: Arc::new(PgAccessStore::new(pool.clone())),
            pool,
            permissions: PermissionCache::new(),
            settings: Arc::new(settings),
        }
    }

    pub fn with_access_store(mut self, store: Arc<dyn AccessStore>) -> Self {
        self.access = store;
        self.permissions = PermissionCache::new();
        self
    }

    /// Check the permission grid for the caller's role before acting.
    pub async fn authorize(&self, access: &TenantAccess, page_key: &str, action: Action) -> Result<(), AppError> {
        let table = self.permissions.get(self.access.as_ref()).await?;
        access.require(&table, page_key, action)
    }
}
