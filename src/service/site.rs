//! Storefront configuration, one row per tenant.

use crate::error::AppError;
use crate::model::{SiteConfig, SiteConfigInput};
use crate::store::qualified_table;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const COLUMNS: &str =
    "tenant_id, site_name, logo_url, contact_email, contact_phone, whatsapp, seo_title, seo_description, extra, updated_at";

type SiteRow = (
    Uuid,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    serde_json::Value,
    DateTime<Utc>,
);

fn site_from_row(row: SiteRow) -> SiteConfig {
    let (tenant_id, site_name, logo_url, contact_email, contact_phone, whatsapp, seo_title, seo_description, extra, updated_at) =
        row;
    SiteConfig {
        tenant_id,
        site_name,
        logo_url,
        contact_email,
        contact_phone,
        whatsapp,
        seo_title,
        seo_description,
        extra,
        updated_at,
    }
}

pub struct SiteService;

impl SiteService {
    pub async fn get(pool: &PgPool, tenant_id: Uuid) -> Result<Option<SiteConfig>, AppError> {
        let sql = format!("SELECT {} FROM {} WHERE tenant_id = $1", COLUMNS, qualified_table("site_config"));
        let row: Option<SiteRow> = sqlx::query_as(&sql).bind(tenant_id).fetch_optional(pool).await?;
        Ok(row.map(site_from_row))
    }

    /// Create the row or merge the given fields into it. `extra` replaces the stored object when present.
    pub async fn upsert(pool: &PgPool, tenant_id: Uuid, input: &SiteConfigInput) -> Result<SiteConfig, AppError> {
        if let Some(extra) = &input.extra {
            if !extra.is_object() {
                return Err(AppError::Validation("extra must be a JSON object".into()));
            }
        }
        let sql = format!(
            r#"
            INSERT INTO {table} (tenant_id, site_name, logo_url, contact_email, contact_phone, whatsapp,
                                 seo_title, seo_description, extra)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, '{{}}'::jsonb))
            ON CONFLICT (tenant_id) DO UPDATE SET
                site_name = COALESCE(EXCLUDED.site_name, {table}.site_name),
                logo_url = COALESCE(EXCLUDED.logo_url, {table}.logo_url),
                contact_email = COALESCE(EXCLUDED.contact_email, {table}.contact_email),
                contact_phone = COALESCE(EXCLUDED.contact_phone, {table}.contact_phone),
                whatsapp = COALESCE(EXCLUDED.whatsapp, {table}.whatsapp),
                seo_title = COALESCE(EXCLUDED.seo_title, {table}.seo_title),
                seo_description = COALESCE(EXCLUDED.seo_description, {table}.seo_description),
                extra = COALESCE($9, {table}.extra),
                updated_at = NOW()
            RETURNING {columns}
            "#,
            table = qualified_table("site_config"),
            columns = COLUMNS
        );
        let row: SiteRow = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(&input.site_name)
            .bind(&input.logo_url)
            .bind(&input.contact_email)
            .bind(&input.contact_phone)
            .bind(&input.whatsapp)
            .bind(&input.seo_title)
            .bind(&input.seo_description)
            .bind(&input.extra)
            .fetch_one(pool)
            .await?;
        tracing::info!(tenant_id = %tenant_id, "site configuration saved");
        Ok(site_from_row(row))
    }
}
