//! Tenant memberships and their roles.

use crate::error::AppError;
use crate::model::{Role, TenantUser};
use crate::store::qualified_table;
use sqlx::PgPool;
use uuid::Uuid;

/// Rules for changing a membership from `current` to `next` (`None` = no membership).
/// Owner rows are only granted or touched by owners, and a tenant always keeps one owner.
pub fn check_role_change(actor: Role, current: Option<Role>, next: Option<Role>, owners: i64) -> Result<(), AppError> {
    let touches_owner = current == Some(Role::Owner) || next == Some(Role::Owner);
    if touches_owner && actor != Role::Owner {
        return Err(AppError::Forbidden("only an owner can grant or change the owner role".into()));
    }
    if current == Some(Role::Owner) && next != Some(Role::Owner) && owners <= 1 {
        return Err(AppError::Conflict("a tenant must keep at least one owner".into()));
    }
    Ok(())
}

pub struct MemberService;

impl MemberService {
    pub async fn list(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<TenantUser>, AppError> {
        let sql = format!(
            "SELECT user_id, role FROM {} WHERE tenant_id = $1 ORDER BY created_at, user_id",
            qualified_table("tenant_users")
        );
        let rows: Vec<(Uuid, String)> = sqlx::query_as(&sql).bind(tenant_id).fetch_all(pool).await?;
        rows.into_iter()
            .map(|(user_id, role)| {
                Ok(TenantUser {
                    tenant_id,
                    user_id,
                    role: role.parse()?,
                })
            })
            .collect()
    }

    /// Add `user_id` with `role`, or change the role of an existing member.
    pub async fn upsert(pool: &PgPool, tenant_id: Uuid, actor: Role, user_id: Uuid, role: Role) -> Result<TenantUser, AppError> {
        Self::change(pool, tenant_id, actor, user_id, Some(role)).await?;
        tracing::info!(tenant_id = %tenant_id, user_id = %user_id, role = role.as_str(), "membership saved");
        Ok(TenantUser { tenant_id, user_id, role })
    }

    /// Returns whether a membership was removed.
    pub async fn remove(pool: &PgPool, tenant_id: Uuid, actor: Role, user_id: Uuid) -> Result<bool, AppError> {
        let removed = Self::change(pool, tenant_id, actor, user_id, None).await?;
        if removed {
            tracing::info!(tenant_id = %tenant_id, user_id = %user_id, "membership removed");
        }
        Ok(removed)
    }

    async fn change(pool: &PgPool, tenant_id: Uuid, actor: Role, user_id: Uuid, next: Option<Role>) -> Result<bool, AppError> {
        let table = qualified_table("tenant_users");
        let mut tx = pool.begin().await?;

        // Lock the tenant's owner rows so two demotions cannot both pass the last-owner check.
        let owners: Vec<(Uuid,)> = sqlx::query_as(&format!(
            "SELECT user_id FROM {} WHERE tenant_id = $1 AND role = 'owner' FOR UPDATE",
            table
        ))
        .bind(tenant_id)
        .fetch_all(&mut *tx)
        .await?;
        let current: Option<String> = sqlx::query_scalar(&format!(
            "SELECT role FROM {} WHERE tenant_id = $1 AND user_id = $2 FOR UPDATE",
            table
        ))
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let current: Option<Role> = current.map(|r| r.parse()).transpose()?;

        check_role_change(actor, current, next, owners.len() as i64)?;

        let affected = match next {
            Some(role) => sqlx::query(&format!(
                r#"
                INSERT INTO {} (tenant_id, user_id, role) VALUES ($1, $2, $3)
                ON CONFLICT (tenant_id, user_id) DO UPDATE SET role = EXCLUDED.role
                "#,
                table
            ))
            .bind(tenant_id)
            .bind(user_id)
            .bind(role.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected(),
            None => sqlx::query(&format!("DELETE FROM {} WHERE tenant_id = $1 AND user_id = $2", table))
                .bind(tenant_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?
                .rows_affected(),
        };
        tx.commit().await?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_owners_touch_owner_rows() {
        assert!(check_role_change(Role::Admin, None, Some(Role::Agent), 1).is_ok());
        assert!(matches!(
            check_role_change(Role::Admin, None, Some(Role::Owner), 1),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            check_role_change(Role::Admin, Some(Role::Owner), None, 2),
            Err(AppError::Forbidden(_))
        ));
        assert!(check_role_change(Role::Owner, None, Some(Role::Owner), 1).is_ok());
    }

    #[test]
    fn last_owner_cannot_leave() {
        assert!(matches!(
            check_role_change(Role::Owner, Some(Role::Owner), Some(Role::Admin), 1),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            check_role_change(Role::Owner, Some(Role::Owner), None, 1),
            Err(AppError::Conflict(_))
        ));
        assert!(check_role_change(Role::Owner, Some(Role::Owner), None, 2).is_ok());
    }
}
