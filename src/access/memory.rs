//! In-memory `AccessStore` for tests and local tooling.

use crate::access::AccessStore;
use crate::error::AppError;
use crate::model::{Domain, DomainType, RolePermission, Tenant, TenantUser};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryAccessStore {
    tenants: RwLock<Vec<Tenant>>,
    domains: RwLock<Vec<Domain>>,
    members: RwLock<Vec<TenantUser>>,
    permissions: RwLock<Vec<RolePermission>>,
    unavailable: AtomicBool,
}

impl MemoryAccessStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(self, tenant: Tenant) -> Self {
        self.insert_tenant(tenant);
        self
    }

    pub fn with_domain(self, domain: Domain) -> Self {
        self.insert_domain(domain);
        self
    }

    pub fn with_member(self, member: TenantUser) -> Self {
        self.insert_member(member);
        self
    }

    pub fn with_permissions(self, rows: impl IntoIterator<Item = RolePermission>) -> Self {
        self.permissions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(rows);
        self
    }

    pub fn insert_tenant(&self, tenant: Tenant) {
        self.tenants.write().unwrap_or_else(PoisonError::into_inner).push(tenant);
    }

    pub fn insert_domain(&self, mut domain: Domain) {
        domain.hostname = domain.hostname.to_lowercase();
        self.domains.write().unwrap_or_else(PoisonError::into_inner).push(domain);
    }

    pub fn insert_member(&self, member: TenantUser) {
        let mut members = self.members.write().unwrap_or_else(PoisonError::into_inner);
        members.retain(|m| !(m.tenant_id == member.tenant_id && m.user_id == member.user_id));
        members.push(member);
    }

    /// Replaces the whole grid, as a saved edit would.
    pub fn set_permissions(&self, rows: Vec<RolePermission>) {
        *self.permissions.write().unwrap_or_else(PoisonError::into_inner) = rows;
    }

    /// Makes every lookup fail, as an unreachable database would.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Db(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl AccessStore for MemoryAccessStore {
    async fn find_domain(&self, hostname: &str, domain_type: Option<DomainType>) -> Result<Option<Domain>, AppError> {
        self.check_available()?;
        let domains = self.domains.read().unwrap_or_else(PoisonError::into_inner);
        let mut matching: Vec<&Domain> = domains
            .iter()
            .filter(|d| d.hostname == hostname && domain_type.map(|t| t == d.domain_type).unwrap_or(true))
            .collect();
        matching.sort_by_key(|d| !d.is_primary);
        Ok(matching.first().map(|d| (*d).clone()))
    }

    async fn find_tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError> {
        self.check_available()?;
        let tenants = self.tenants.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tenants.iter().find(|t| t.id == tenant_id).cloned())
    }

    async fn first_active_tenant(&self) -> Result<Option<Tenant>, AppError> {
        self.check_available()?;
        let tenants = self.tenants.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tenants
            .iter()
            .filter(|t| t.is_active())
            .min_by_key(|t| (t.created_at, t.id))
            .cloned())
    }

    async fn find_membership(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Option<TenantUser>, AppError> {
        self.check_available()?;
        let members = self.members.read().unwrap_or_else(PoisonError::into_inner);
        Ok(members
            .iter()
            .find(|m| m.tenant_id == tenant_id && m.user_id == user_id)
            .cloned())
    }

    async fn role_permissions(&self) -> Result<Vec<RolePermission>, AppError> {
        self.check_available()?;
        Ok(self.permissions.read().unwrap_or_else(PoisonError::into_inner).clone())
    }
}
