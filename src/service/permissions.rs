//! Edits to the role permission grid.

use crate::access::PermissionCache;
use crate::error::AppError;
use crate::model::RolePermission;
use crate::store::qualified_table;
use sqlx::PgPool;

pub struct PermissionService;

impl PermissionService {
    /// Upsert every row in one transaction, then drop the cached table so the next check reloads it.
    /// Rows not mentioned keep their stored flags.
    pub async fn save_grid(pool: &PgPool, cache: &PermissionCache, rows: &[RolePermission]) -> Result<usize, AppError> {
        for row in rows {
            row.validate()?;
        }
        let sql = format!(
            r#"
            INSERT INTO {} (role, page_key, can_view, can_create, can_edit, can_delete, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (role, page_key) DO UPDATE SET
                can_view = EXCLUDED.can_view,
                can_create = EXCLUDED.can_create,
                can_edit = EXCLUDED.can_edit,
                can_delete = EXCLUDED.can_delete,
                updated_at = NOW()
            "#,
            qualified_table("role_permissions")
        );
        let mut tx = pool.begin().await?;
        for row in rows {
            sqlx::query(&sql)
                .bind(row.role.as_str())
                .bind(row.page_key.trim())
                .bind(row.can_view)
                .bind(row.can_create)
                .bind(row.can_edit)
                .bind(row.can_delete)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        cache.invalidate();
        tracing::info!(rows = rows.len(), "permission grid updated");
        Ok(rows.len())
    }
}
