//! Table DDL and bootstrap. All tables live in a schema named from `ZATCH_SCHEMA` env (default `zatch`).

use crate::error::AppError;
use crate::model::default_grid;
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

/// Schema name for application tables. From env `ZATCH_SCHEMA`, default `zatch`. Must be a valid PostgreSQL identifier.
pub fn zatch_schema() -> String {
    std::env::var("ZATCH_SCHEMA").unwrap_or_else(|_| "zatch".into())
}

/// Returns schema-qualified table name (e.g. "zatch.domains").
pub fn qualified_table(table: &str) -> String {
    format!("{}.{}", zatch_schema(), table)
}

/// Create the schema from `ZATCH_SCHEMA` if missing, then every table, then seed the permission grid.
pub async fn ensure_tables(pool: &PgPool) -> Result<(), AppError> {
    let schema = zatch_schema();
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", schema))
        .execute(pool)
        .await?;

    let tenants = qualified_table("tenants");
    let ddl = [
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'inactive')),
                settings JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            tenants
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY,
                tenant_id UUID NOT NULL REFERENCES {} (id) ON DELETE CASCADE,
                hostname TEXT NOT NULL UNIQUE CHECK (hostname = lower(hostname)),
                type TEXT NOT NULL CHECK (type IN ('admin', 'public')),
                is_primary BOOLEAN NOT NULL DEFAULT FALSE,
                verified BOOLEAN NOT NULL DEFAULT FALSE,
                verify_token TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            qualified_table("domains"),
            tenants
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                tenant_id UUID NOT NULL REFERENCES {} (id) ON DELETE CASCADE,
                user_id UUID NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('owner', 'admin', 'agent')),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (tenant_id, user_id)
            )
            "#,
            qualified_table("tenant_users"),
            tenants
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                role TEXT NOT NULL CHECK (role IN ('owner', 'admin', 'agent')),
                page_key TEXT NOT NULL,
                can_view BOOLEAN NOT NULL DEFAULT FALSE,
                can_create BOOLEAN NOT NULL DEFAULT FALSE,
                can_edit BOOLEAN NOT NULL DEFAULT FALSE,
                can_delete BOOLEAN NOT NULL DEFAULT FALSE,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (role, page_key)
            )
            "#,
            qualified_table("role_permissions")
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY,
                tenant_id UUID NOT NULL REFERENCES {} (id) ON DELETE CASCADE,
                slug TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL CHECK (status IN ('venda', 'aluguel', 'vendido', 'alugado')),
                price DOUBLE PRECISION,
                area_m2 DOUBLE PRECISION,
                bedrooms INTEGER,
                bathrooms INTEGER,
                parking_spots INTEGER,
                address TEXT,
                neighborhood TEXT,
                city TEXT,
                state TEXT,
                featured BOOLEAN NOT NULL DEFAULT FALSE,
                images JSONB NOT NULL DEFAULT '[]'::jsonb,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                UNIQUE (tenant_id, slug)
            )
            "#,
            qualified_table("properties"),
            tenants
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY,
                tenant_id UUID NOT NULL REFERENCES {} (id) ON DELETE CASCADE,
                property_id UUID,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT,
                message TEXT NOT NULL,
                read BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            qualified_table("contact_messages"),
            tenants
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                tenant_id UUID PRIMARY KEY REFERENCES {} (id) ON DELETE CASCADE,
                site_name TEXT,
                logo_url TEXT,
                contact_email TEXT,
                contact_phone TEXT,
                whatsapp TEXT,
                seo_title TEXT,
                seo_description TEXT,
                extra JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            qualified_table("site_config"),
            tenants
        ),
    ];
    for sql in &ddl {
        sqlx::query(sql).execute(pool).await?;
    }

    let indexes = [
        format!(
            "CREATE INDEX IF NOT EXISTS properties_tenant_created_idx ON {} (tenant_id, created_at DESC)",
            qualified_table("properties")
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS contact_messages_tenant_created_idx ON {} (tenant_id, created_at DESC)",
            qualified_table("contact_messages")
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS domains_tenant_idx ON {} (tenant_id)",
            qualified_table("domains")
        ),
    ];
    for sql in &indexes {
        sqlx::query(sql).execute(pool).await?;
    }

    seed_permissions(pool).await
}

/// Insert the default grid; rows already edited by an admin are left alone.
async fn seed_permissions(pool: &PgPool) -> Result<(), AppError> {
    let sql = format!(
        r#"
        INSERT INTO {} (role, page_key, can_view, can_create, can_edit, can_delete)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (role, page_key) DO NOTHING
        "#,
        qualified_table("role_permissions")
    );
    let mut tx = pool.begin().await?;
    for row in default_grid() {
        sqlx::query(&sql)
            .bind(row.role.as_str())
            .bind(&row.page_key)
            .bind(row.can_view)
            .bind(row.can_create)
            .bind(row.can_edit)
            .bind(row.can_delete)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await.map_err(AppError::Db)?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await
        .map_err(AppError::Db)?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await
            .map_err(AppError::Db)?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url.rfind('/').ok_or_else(|| AppError::BadRequest("DATABASE_URL: no path".into()))? + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_name_is_split_from_url() {
        let (admin, name) = parse_db_name_from_url("postgres://u:p@localhost:5432/zatch?sslmode=disable").unwrap();
        assert_eq!(admin, "postgres://u:p@localhost:5432/postgres");
        assert_eq!(name, "zatch");
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
