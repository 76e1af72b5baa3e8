//! Tenant user management.

use crate::access::TenantAccess;
use crate::error::AppError;
use crate::model::{pages, Action, MemberRole, TenantUser};
use crate::response::{success_many, success_one_ok, SuccessMany, SuccessOne};
use crate::service::MemberService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

pub async fn list(
    State(state): State<AppState>,
    access: TenantAccess,
) -> Result<(StatusCode, Json<SuccessMany<TenantUser>>), AppError> {
    state.authorize(&access, pages::USERS, Action::View).await?;
    let rows = MemberService::list(&state.pool, access.tenant.id).await?;
    Ok(success_many(rows))
}

/// PUT members/:user_id: add the user or change their role.
pub async fn put(
    State(state): State<AppState>,
    access: TenantAccess,
    Path(user_id): Path<Uuid>,
    Json(body): Json<MemberRole>,
) -> Result<(StatusCode, Json<SuccessOne<TenantUser>>), AppError> {
    state.authorize(&access, pages::USERS, Action::Edit).await?;
    let actor = access
        .role()
        .ok_or_else(|| AppError::Forbidden("not a member of this tenant".into()))?;
    let member = MemberService::upsert(&state.pool, access.tenant.id, actor, user_id, body.role).await?;
    Ok(success_one_ok(member))
}

pub async fn delete(
    State(state): State<AppState>,
    access: TenantAccess,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.authorize(&access, pages::USERS, Action::Delete).await?;
    let actor = access
        .role()
        .ok_or_else(|| AppError::Forbidden("not a member of this tenant".into()))?;
    if !MemberService::remove(&state.pool, access.tenant.id, actor, user_id).await? {
        return Err(AppError::NotFound(format!("member {}", user_id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
