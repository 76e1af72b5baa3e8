//! Role permission lookup over the `(role, page, action)` grid.

use crate::access::AccessStore;
use crate::error::AppError;
use crate::model::{pages, Action, Role, RolePermission};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Clone, Debug, Default)]
pub struct PermissionTable {
    rows: HashMap<(Role, String), RolePermission>,
}

impl PermissionTable {
    pub fn from_rows(rows: impl IntoIterator<Item = RolePermission>) -> Self {
        let rows = rows
            .into_iter()
            .map(|r| ((r.role, r.page_key.clone()), r))
            .collect();
        PermissionTable { rows }
    }

    /// `admin` is always allowed; a missing row denies.
    pub fn can_access(&self, role: Role, page_key: &str, action: Action) -> bool {
        if role == Role::Admin {
            return true;
        }
        self.rows
            .get(&(role, page_key.to_string()))
            .map(|r| r.allows(action))
            .unwrap_or(false)
    }

    /// Allowed actions per page for one role, over the known pages plus any page in the grid.
    pub fn grants_for(&self, role: Role) -> BTreeMap<String, Vec<Action>> {
        let mut page_keys: Vec<String> = pages::ALL.iter().map(|p| p.to_string()).collect();
        page_keys.extend(self.rows.keys().map(|(_, page)| page.clone()));
        page_keys
            .into_iter()
            .map(|page| {
                let actions = Action::ALL
                    .into_iter()
                    .filter(|a| self.can_access(role, &page, *a))
                    .collect();
                (page, actions)
            })
            .collect()
    }

    pub fn rows(&self) -> Vec<RolePermission> {
        let mut out: Vec<RolePermission> = self.rows.values().cloned().collect();
        out.sort_by(|a, b| (a.role, &a.page_key).cmp(&(b.role, &b.page_key)));
        out
    }
}

/// Process-wide cache of the grid. Loaded on first use, dropped whenever the grid is edited.
#[derive(Clone, Default)]
pub struct PermissionCache {
    inner: Arc<RwLock<CacheSlot>>,
}

/// `generation` moves on every invalidation; a load started under an older one is not stored.
#[derive(Default)]
struct CacheSlot {
    generation: u64,
    table: Option<Arc<PermissionTable>>,
}

impl PermissionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, store: &dyn AccessStore) -> Result<Arc<PermissionTable>, AppError> {
        let generation = {
            let slot = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(table) = &slot.table {
                return Ok(table.clone());
            }
            slot.generation
        };
        let rows = store.role_permissions().await?;
        let table = Arc::new(PermissionTable::from_rows(rows));
        let mut slot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if slot.generation == generation {
            slot.table = Some(table.clone());
            tracing::debug!("permission grid loaded");
        } else {
            tracing::debug!("permission grid changed while loading, not cached");
        }
        Ok(table)
    }

    pub fn invalidate(&self) {
        let mut slot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        slot.generation = slot.generation.wrapping_add(1);
        slot.table = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::MemoryAccessStore;
    use crate::model::{Domain, DomainType, Tenant, TenantUser};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use uuid::Uuid;

    fn table() -> PermissionTable {
        PermissionTable::from_rows(vec![
            RolePermission::new(Role::Agent, pages::PROPERTIES, &[Action::View, Action::Edit]),
            RolePermission::new(Role::Owner, pages::USERS, &Action::ALL),
        ])
    }

    #[test]
    fn admin_passes_everything() {
        let t = PermissionTable::default();
        for page in ["properties", "unknown-page", ""] {
            for action in Action::ALL {
                assert!(t.can_access(Role::Admin, page, action));
            }
        }
    }

    #[test]
    fn rows_grant_only_their_actions() {
        let t = table();
        assert!(t.can_access(Role::Agent, pages::PROPERTIES, Action::View));
        assert!(t.can_access(Role::Agent, pages::PROPERTIES, Action::Edit));
        assert!(!t.can_access(Role::Agent, pages::PROPERTIES, Action::Delete));
        assert!(t.can_access(Role::Owner, pages::USERS, Action::Delete));
    }

    #[test]
    fn missing_rows_deny() {
        let t = table();
        assert!(!t.can_access(Role::Agent, pages::USERS, Action::View));
        assert!(!t.can_access(Role::Owner, pages::PROPERTIES, Action::View));
        assert!(!t.can_access(Role::Agent, "reports", Action::View));
    }

    #[test]
    fn grants_list_every_known_page() {
        let grants = table().grants_for(Role::Agent);
        assert_eq!(grants.len(), pages::ALL.len());
        assert_eq!(grants[pages::PROPERTIES], vec![Action::View, Action::Edit]);
        assert!(grants[pages::DOMAINS].is_empty());
    }

    #[tokio::test]
    async fn cache_serves_stale_grid_until_invalidated() {
        let store = MemoryAccessStore::new()
            .with_permissions([RolePermission::new(Role::Agent, pages::MESSAGES, &[Action::View])]);
        let cache = PermissionCache::new();
        let first = cache.get(&store).await.unwrap();
        assert!(first.can_access(Role::Agent, pages::MESSAGES, Action::View));

        store.set_unavailable(true);
        assert!(cache.get(&store).await.is_ok());
        cache.invalidate();
        assert!(cache.get(&store).await.is_err());
    }

    /// Clears the grid and invalidates the cache while the first load is in flight,
    /// the way a grid save racing a gate check would.
    struct RevokingStore {
        inner: MemoryAccessStore,
        cache: PermissionCache,
        revoked: AtomicBool,
    }

    #[async_trait]
    impl AccessStore for RevokingStore {
        async fn find_domain(&self, hostname: &str, domain_type: Option<DomainType>) -> Result<Option<Domain>, AppError> {
            self.inner.find_domain(hostname, domain_type).await
        }

        async fn find_tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError> {
            self.inner.find_tenant(tenant_id).await
        }

        async fn first_active_tenant(&self) -> Result<Option<Tenant>, AppError> {
            self.inner.first_active_tenant().await
        }

        async fn find_membership(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Option<TenantUser>, AppError> {
            self.inner.find_membership(tenant_id, user_id).await
        }

        async fn role_permissions(&self) -> Result<Vec<RolePermission>, AppError> {
            let rows = self.inner.role_permissions().await?;
            if !self.revoked.swap(true, Ordering::SeqCst) {
                self.inner.set_permissions(Vec::new());
                tokio::task::yield_now().await;
                self.cache.invalidate();
            }
            Ok(rows)
        }
    }

    #[tokio::test]
    async fn invalidation_during_a_load_is_not_overwritten() {
        let cache = PermissionCache::new();
        let store = RevokingStore {
            inner: MemoryAccessStore::new()
                .with_permissions([RolePermission::new(Role::Agent, pages::USERS, &Action::ALL)]),
            cache: cache.clone(),
            revoked: AtomicBool::new(false),
        };

        let in_flight = cache.get(&store).await.unwrap();
        assert!(in_flight.can_access(Role::Agent, pages::USERS, Action::Delete));

        let after = cache.get(&store).await.unwrap();
        assert!(!after.can_access(Role::Agent, pages::USERS, Action::Delete));
    }
}
