//! Listing persistence, scoped to one tenant per call.

use crate::error::AppError;
use crate::model::{next_free_slug, slugify, NewProperty, Property, PropertyFilter, PropertyPatch};
use crate::store::qualified_table;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use std::collections::HashSet;
use uuid::Uuid;

const COLUMNS: &str = "id, tenant_id, slug, title, description, status, price, area_m2, bedrooms, bathrooms, \
     parking_spots, address, neighborhood, city, state, featured, images, created_at, updated_at";

const DEFAULT_LIMIT: u32 = 24;
const MAX_LIMIT: u32 = 200;

#[derive(sqlx::FromRow)]
struct PropertyRow {
    id: Uuid,
    tenant_id: Uuid,
    slug: String,
    title: String,
    description: Option<String>,
    status: String,
    price: Option<f64>,
    area_m2: Option<f64>,
    bedrooms: Option<i32>,
    bathrooms: Option<i32>,
    parking_spots: Option<i32>,
    address: Option<String>,
    neighborhood: Option<String>,
    city: Option<String>,
    state: Option<String>,
    featured: bool,
    images: Json<Vec<String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PropertyRow> for Property {
    type Error = AppError;

    fn try_from(r: PropertyRow) -> Result<Self, Self::Error> {
        Ok(Property {
            id: r.id,
            tenant_id: r.tenant_id,
            slug: r.slug,
            title: r.title,
            description: r.description,
            status: r.status.parse()?,
            price: r.price,
            area_m2: r.area_m2,
            bedrooms: r.bedrooms,
            bathrooms: r.bathrooms,
            parking_spots: r.parking_spots,
            address: r.address,
            neighborhood: r.neighborhood,
            city: r.city,
            state: r.state,
            featured: r.featured,
            images: r.images.0,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

fn into_properties(rows: Vec<PropertyRow>) -> Result<Vec<Property>, AppError> {
    rows.into_iter().map(Property::try_from).collect()
}

/// `%term%` with LIKE wildcards in the term escaped.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

pub struct PropertyService;

impl PropertyService {
    /// Filtered listing, featured first then newest. Limit defaults to 24, capped at 200.
    pub async fn list(pool: &PgPool, tenant_id: Uuid, filter: &PropertyFilter) -> Result<Vec<Property>, AppError> {
        let limit = filter.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = filter.offset.unwrap_or(0);

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM {} WHERE tenant_id = ",
            COLUMNS,
            qualified_table("properties")
        ));
        qb.push_bind(tenant_id);
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(city) = filter.city.as_deref().filter(|s| !s.trim().is_empty()) {
            qb.push(" AND lower(city) = lower(").push_bind(city.trim().to_string()).push(")");
        }
        if let Some(n) = filter.neighborhood.as_deref().filter(|s| !s.trim().is_empty()) {
            qb.push(" AND lower(neighborhood) = lower(").push_bind(n.trim().to_string()).push(")");
        }
        if let Some(min) = filter.min_price {
            qb.push(" AND price >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price {
            qb.push(" AND price <= ").push_bind(max);
        }
        if let Some(beds) = filter.min_bedrooms {
            qb.push(" AND bedrooms >= ").push_bind(beds);
        }
        if let Some(featured) = filter.featured {
            qb.push(" AND featured = ").push_bind(featured);
        }
        if let Some(q) = filter.q.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = like_pattern(q);
            qb.push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR neighborhood ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        qb.push(" ORDER BY featured DESC, created_at DESC LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(i64::from(offset));

        tracing::debug!(sql = %qb.sql(), "list properties");
        let rows: Vec<PropertyRow> = qb.build_query_as().fetch_all(pool).await?;
        into_properties(rows)
    }

    pub async fn get(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<Option<Property>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE tenant_id = $1 AND id = $2",
            COLUMNS,
            qualified_table("properties")
        );
        let row: Option<PropertyRow> = sqlx::query_as(&sql).bind(tenant_id).bind(id).fetch_optional(pool).await?;
        row.map(Property::try_from).transpose()
    }

    pub async fn get_by_slug(pool: &PgPool, tenant_id: Uuid, slug: &str) -> Result<Option<Property>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE tenant_id = $1 AND slug = $2",
            COLUMNS,
            qualified_table("properties")
        );
        let row: Option<PropertyRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(slug.to_lowercase())
            .fetch_optional(pool)
            .await?;
        row.map(Property::try_from).transpose()
    }

    /// Lookup by UUID when `key` parses as one, by slug otherwise.
    pub async fn get_by_key(pool: &PgPool, tenant_id: Uuid, key: &str) -> Result<Option<Property>, AppError> {
        match Uuid::parse_str(key) {
            Ok(id) => Self::get(pool, tenant_id, id).await,
            Err(_) => Self::get_by_slug(pool, tenant_id, key).await,
        }
    }

    pub async fn create(pool: &PgPool, tenant_id: Uuid, input: &NewProperty) -> Result<Property, AppError> {
        input.validate()?;
        let mut tx = pool.begin().await?;
        let created = Self::insert(&mut tx, tenant_id, input).await?;
        tx.commit().await?;
        tracing::info!(tenant_id = %tenant_id, property_id = %created.id, slug = %created.slug, "property created");
        Ok(created)
    }

    /// Insert every row or none. Rows are validated before the transaction starts.
    pub async fn import_many(pool: &PgPool, tenant_id: Uuid, items: &[NewProperty]) -> Result<Vec<Property>, AppError> {
        for item in items {
            item.validate()?;
        }
        let mut out = Vec::with_capacity(items.len());
        let mut tx = pool.begin().await?;
        for item in items {
            out.push(Self::insert(&mut tx, tenant_id, item).await?);
        }
        tx.commit().await?;
        tracing::info!(tenant_id = %tenant_id, count = out.len(), "properties imported");
        Ok(out)
    }

    async fn insert(conn: &mut PgConnection, tenant_id: Uuid, input: &NewProperty) -> Result<Property, AppError> {
        let status = input
            .status
            .ok_or_else(|| AppError::Validation("status is required".into()))?;
        let base = slugify(input.slug.as_deref().unwrap_or(&input.title));
        let slug = Self::free_slug(&mut *conn, tenant_id, &base).await?;

        let sql = format!(
            r#"
            INSERT INTO {} (id, tenant_id, slug, title, description, status, price, area_m2, bedrooms, bathrooms,
                            parking_spots, address, neighborhood, city, state, featured, images)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {}
            "#,
            qualified_table("properties"),
            COLUMNS
        );
        let row: PropertyRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(tenant_id)
            .bind(&slug)
            .bind(input.title.trim())
            .bind(&input.description)
            .bind(status.as_str())
            .bind(input.price)
            .bind(input.area_m2)
            .bind(input.bedrooms)
            .bind(input.bathrooms)
            .bind(input.parking_spots)
            .bind(&input.address)
            .bind(&input.neighborhood)
            .bind(&input.city)
            .bind(&input.state)
            .bind(input.featured)
            .bind(Json(&input.images))
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, format!("slug already in use: {}", slug)))?;
        row.try_into()
    }

    async fn free_slug(conn: &mut PgConnection, tenant_id: Uuid, base: &str) -> Result<String, AppError> {
        let sql = format!(
            "SELECT slug FROM {} WHERE tenant_id = $1 AND (slug = $2 OR slug LIKE $3)",
            qualified_table("properties")
        );
        let base = if base.is_empty() { "imovel" } else { base };
        let taken: Vec<(String,)> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(base)
            .bind(format!("{}-%", base))
            .fetch_all(&mut *conn)
            .await?;
        let taken: HashSet<String> = taken.into_iter().map(|(s,)| s).collect();
        Ok(next_free_slug(base, &taken))
    }

    /// Apply the fields present in `patch`; the slug never changes.
    pub async fn update(pool: &PgPool, tenant_id: Uuid, id: Uuid, patch: &PropertyPatch) -> Result<Option<Property>, AppError> {
        patch.validate()?;
        let sql = format!(
            r#"
            UPDATE {} SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                status = COALESCE($5, status),
                price = COALESCE($6, price),
                area_m2 = COALESCE($7, area_m2),
                bedrooms = COALESCE($8, bedrooms),
                bathrooms = COALESCE($9, bathrooms),
                parking_spots = COALESCE($10, parking_spots),
                address = COALESCE($11, address),
                neighborhood = COALESCE($12, neighborhood),
                city = COALESCE($13, city),
                state = COALESCE($14, state),
                featured = COALESCE($15, featured),
                images = COALESCE($16, images),
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING {}
            "#,
            qualified_table("properties"),
            COLUMNS
        );
        let row: Option<PropertyRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(id)
            .bind(patch.title.as_deref().map(str::trim))
            .bind(&patch.description)
            .bind(patch.status.map(|s| s.as_str()))
            .bind(patch.price)
            .bind(patch.area_m2)
            .bind(patch.bedrooms)
            .bind(patch.bathrooms)
            .bind(patch.parking_spots)
            .bind(&patch.address)
            .bind(&patch.neighborhood)
            .bind(&patch.city)
            .bind(&patch.state)
            .bind(patch.featured)
            .bind(patch.images.as_ref().map(Json))
            .fetch_optional(pool)
            .await?;
        row.map(Property::try_from).transpose()
    }

    /// Returns whether a row was deleted.
    pub async fn delete(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let sql = format!(
            "DELETE FROM {} WHERE tenant_id = $1 AND id = $2",
            qualified_table("properties")
        );
        let result = sqlx::query(&sql).bind(tenant_id).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Every listing of the tenant, oldest first, for CSV export.
    pub async fn all_for_export(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<Property>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE tenant_id = $1 ORDER BY created_at ASC",
            COLUMNS,
            qualified_table("properties")
        );
        let rows: Vec<PropertyRow> = sqlx::query_as(&sql).bind(tenant_id).fetch_all(pool).await?;
        into_properties(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn search_terms_cannot_inject_wildcards() {
        assert_eq!(like_pattern(" casa "), "%casa%");
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
    }
}
