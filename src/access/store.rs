//! Read side of tenant resolution: domains, tenants, memberships and the permission grid.

use crate::error::AppError;
use crate::model::{Domain, DomainType, RolePermission, Tenant, TenantUser};
use crate::store::qualified_table;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Lookups the resolver and the gate depend on. `PgAccessStore` in production, `MemoryAccessStore` in tests.
#[async_trait]
pub trait AccessStore: Send + Sync {
    /// Domain by exact (already lowercased) hostname; `None` type matches any type.
    async fn find_domain(&self, hostname: &str, domain_type: Option<DomainType>) -> Result<Option<Domain>, AppError>;

    async fn find_tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError>;

    /// Oldest active tenant, for the development fallback.
    async fn first_active_tenant(&self) -> Result<Option<Tenant>, AppError>;

    async fn find_membership(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Option<TenantUser>, AppError>;

    async fn role_permissions(&self) -> Result<Vec<RolePermission>, AppError>;
}

#[derive(Clone)]
pub struct PgAccessStore {
    pool: PgPool,
}

impl PgAccessStore {
    pub fn new(pool: PgPool) -> Self {
        PgAccessStore { pool }
    }
}

type DomainRow = (Uuid, Uuid, String, String, bool, bool, String, DateTime<Utc>);
type TenantRow = (Uuid, String, String, String, serde_json::Value, DateTime<Utc>);

pub(crate) fn domain_from_row(row: DomainRow) -> Result<Domain, AppError> {
    let (id, tenant_id, hostname, domain_type, is_primary, verified, verify_token, created_at) = row;
    Ok(Domain {
        id,
        tenant_id,
        hostname,
        domain_type: domain_type.parse()?,
        is_primary,
        verified,
        verify_token,
        created_at,
    })
}

fn tenant_from_row(row: TenantRow) -> Result<Tenant, AppError> {
    let (id, name, slug, status, settings, created_at) = row;
    Ok(Tenant {
        id,
        name,
        slug,
        status: status.parse()?,
        settings,
        created_at,
    })
}

pub(crate) const DOMAIN_COLUMNS: &str =
    "id, tenant_id, hostname, type, is_primary, verified, verify_token, created_at";
const TENANT_COLUMNS: &str = "id, name, slug, status, settings, created_at";

#[async_trait]
impl AccessStore for PgAccessStore {
    async fn find_domain(&self, hostname: &str, domain_type: Option<DomainType>) -> Result<Option<Domain>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE hostname = $1 AND ($2::text IS NULL OR type = $2) ORDER BY is_primary DESC LIMIT 1",
            DOMAIN_COLUMNS,
            qualified_table("domains")
        );
        let row: Option<DomainRow> = sqlx::query_as(&sql)
            .bind(hostname)
            .bind(domain_type.map(|t| t.as_str()))
            .fetch_optional(&self.pool)
            .await?;
        row.map(domain_from_row).transpose()
    }

    async fn find_tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", TENANT_COLUMNS, qualified_table("tenants"));
        let row: Option<TenantRow> = sqlx::query_as(&sql).bind(tenant_id).fetch_optional(&self.pool).await?;
        row.map(tenant_from_row).transpose()
    }

    async fn first_active_tenant(&self) -> Result<Option<Tenant>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE status = 'active' ORDER BY created_at, id LIMIT 1",
            TENANT_COLUMNS,
            qualified_table("tenants")
        );
        let row: Option<TenantRow> = sqlx::query_as(&sql).fetch_optional(&self.pool).await?;
        row.map(tenant_from_row).transpose()
    }

    async fn find_membership(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Option<TenantUser>, AppError> {
        let sql = format!(
            "SELECT role FROM {} WHERE tenant_id = $1 AND user_id = $2",
            qualified_table("tenant_users")
        );
        let role: Option<String> = sqlx::query_scalar(&sql)
            .bind(tenant_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        match role {
            Some(r) => Ok(Some(TenantUser {
                tenant_id,
                user_id,
                role: r.parse()?,
            })),
            None => Ok(None),
        }
    }

    async fn role_permissions(&self) -> Result<Vec<RolePermission>, AppError> {
        let sql = format!(
            "SELECT role, page_key, can_view, can_create, can_edit, can_delete FROM {} ORDER BY role, page_key",
            qualified_table("role_permissions")
        );
        let rows: Vec<(String, String, bool, bool, bool, bool)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        let mut out = Vec::with_capacity(rows.len());
        for (role, page_key, can_view, can_create, can_edit, can_delete) in rows {
            match role.parse() {
                Ok(role) => out.push(RolePermission {
                    role,
                    page_key,
                    can_view,
                    can_create,
                    can_edit,
                    can_delete,
                }),
                Err(_) => tracing::warn!(role = %role, page_key = %page_key, "unknown role in permission grid, skipping"),
            }
        }
        Ok(out)
    }
}
