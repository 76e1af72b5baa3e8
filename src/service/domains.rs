//! Hostnames owned by a tenant.

use crate::access::store::{domain_from_row, DOMAIN_COLUMNS};
use crate::access::{is_local_host, normalize_hostname};
use crate::error::AppError;
use crate::model::{Domain, DomainType, NewDomain, VerificationRecord};
use crate::store::qualified_table;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::OnceLock;
use uuid::Uuid;

type DomainRow = (Uuid, Uuid, String, String, bool, bool, String, DateTime<Utc>);

fn hostname_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}$").expect("static hostname pattern")
    })
}

/// Lowercased hostname if it is a DNS name (or a local development host).
pub fn validate_hostname(raw: &str) -> Result<String, AppError> {
    let host = normalize_hostname(raw);
    if host.len() > 253 || !(hostname_re().is_match(&host) || is_local_host(&host)) {
        return Err(AppError::Validation(format!("invalid hostname: {}", raw.trim())));
    }
    Ok(host)
}

/// A freshly registered domain and the TXT record that will verify it.
#[derive(Debug, Serialize)]
pub struct RegisteredDomain {
    pub domain: Domain,
    pub verification: VerificationRecord,
}

pub struct DomainService;

impl DomainService {
    pub async fn list(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<Domain>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE tenant_id = $1 ORDER BY type, is_primary DESC, hostname",
            DOMAIN_COLUMNS,
            qualified_table("domains")
        );
        let rows: Vec<DomainRow> = sqlx::query_as(&sql).bind(tenant_id).fetch_all(pool).await?;
        rows.into_iter().map(domain_from_row).collect()
    }

    /// Register `input.hostname` unverified with a new token. Hostnames are unique across tenants.
    pub async fn create(pool: &PgPool, tenant_id: Uuid, input: &NewDomain) -> Result<RegisteredDomain, AppError> {
        let hostname = validate_hostname(&input.hostname)?;
        let domain = Domain::new(tenant_id, &hostname, input.domain_type);

        let mut tx = pool.begin().await?;
        if input.is_primary {
            Self::clear_primary(&mut tx, tenant_id, input.domain_type).await?;
        }
        let sql = format!(
            r#"
            INSERT INTO {} (id, tenant_id, hostname, type, is_primary, verified, verify_token, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            qualified_table("domains"),
            DOMAIN_COLUMNS
        );
        let row: DomainRow = sqlx::query_as(&sql)
            .bind(domain.id)
            .bind(domain.tenant_id)
            .bind(&domain.hostname)
            .bind(domain.domain_type.as_str())
            .bind(input.is_primary)
            .bind(domain.verified)
            .bind(&domain.verify_token)
            .bind(domain.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, format!("hostname already registered: {}", hostname)))?;
        tx.commit().await?;

        let domain = domain_from_row(row)?;
        tracing::info!(tenant_id = %tenant_id, hostname = %domain.hostname, domain_type = domain.domain_type.as_str(), "domain registered");
        Ok(RegisteredDomain {
            verification: domain.verification_record(),
            domain,
        })
    }

    pub async fn delete(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let sql = format!(
            "DELETE FROM {} WHERE tenant_id = $1 AND id = $2",
            qualified_table("domains")
        );
        let result = sqlx::query(&sql).bind(tenant_id).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Make `id` the only primary domain of its type for the tenant.
    pub async fn set_primary(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<Option<Domain>, AppError> {
        let mut tx = pool.begin().await?;
        let sql = format!(
            "SELECT type FROM {} WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
            qualified_table("domains")
        );
        let domain_type: Option<String> = sqlx::query_scalar(&sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let domain_type: DomainType = match domain_type {
            Some(t) => t.parse()?,
            None => return Ok(None),
        };
        Self::clear_primary(&mut tx, tenant_id, domain_type).await?;
        let sql = format!(
            "UPDATE {} SET is_primary = TRUE WHERE tenant_id = $1 AND id = $2 RETURNING {}",
            qualified_table("domains"),
            DOMAIN_COLUMNS
        );
        let row: DomainRow = sqlx::query_as(&sql).bind(tenant_id).bind(id).fetch_one(&mut *tx).await?;
        tx.commit().await?;
        domain_from_row(row).map(Some)
    }

    async fn clear_primary(conn: &mut sqlx::PgConnection, tenant_id: Uuid, domain_type: DomainType) -> Result<(), AppError> {
        let sql = format!(
            "UPDATE {} SET is_primary = FALSE WHERE tenant_id = $1 AND type = $2 AND is_primary",
            qualified_table("domains")
        );
        sqlx::query(&sql)
            .bind(tenant_id)
            .bind(domain_type.as_str())
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Verified public hostname used in canonical storefront links: the primary one, else the oldest.
    pub async fn primary_public_hostname(pool: &PgPool, tenant_id: Uuid) -> Result<Option<String>, AppError> {
        let sql = format!(
            r#"
            SELECT hostname FROM {}
            WHERE tenant_id = $1 AND type = 'public' AND verified
            ORDER BY is_primary DESC, created_at ASC
            LIMIT 1
            "#,
            qualified_table("domains")
        );
        let host: Option<String> = sqlx::query_scalar(&sql).bind(tenant_id).fetch_optional(pool).await?;
        Ok(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostnames_are_normalized_and_checked() {
        assert_eq!(validate_hostname("Imoveis.Example.com.").unwrap(), "imoveis.example.com");
        assert_eq!(validate_hostname("painel.localhost:3000").unwrap(), "painel.localhost");
        assert!(validate_hostname("not a host").is_err());
        assert!(validate_hostname("-bad.example.com").is_err());
        assert!(validate_hostname("example").is_err());
    }
}
