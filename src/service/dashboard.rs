//! Back-office counters.

use crate::error::AppError;
use crate::store::qualified_table;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Default, Serialize)]
pub struct DashboardStats {
    pub properties: i64,
    /// Still on the market (`venda` or `aluguel`).
    pub available: i64,
    pub featured: i64,
    pub messages: i64,
    pub unread_messages: i64,
    pub domains: i64,
    pub members: i64,
}

async fn count(pool: &PgPool, table: &str, condition: &str, tenant_id: Uuid) -> Result<i64, AppError> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE tenant_id = $1{}",
        qualified_table(table),
        condition
    );
    let n: i64 = sqlx::query_scalar(&sql).bind(tenant_id).fetch_one(pool).await?;
    Ok(n)
}

pub struct DashboardService;

impl DashboardService {
    /// All counters for one tenant, queried concurrently.
    pub async fn stats(pool: &PgPool, tenant_id: Uuid) -> Result<DashboardStats, AppError> {
        let (properties, available, featured, messages, unread_messages, domains, members) = tokio::try_join!(
            count(pool, "properties", "", tenant_id),
            count(pool, "properties", " AND status IN ('venda', 'aluguel')", tenant_id),
            count(pool, "properties", " AND featured", tenant_id),
            count(pool, "contact_messages", "", tenant_id),
            count(pool, "contact_messages", " AND NOT read", tenant_id),
            count(pool, "domains", "", tenant_id),
            count(pool, "tenant_users", "", tenant_id),
        )?;
        Ok(DashboardStats {
            properties,
            available,
            featured,
            messages,
            unread_messages,
            domains,
            members,
        })
    }
}
