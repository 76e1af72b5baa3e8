//! Dashboard counters, the permission grid and storefront configuration.

use crate::access::TenantAccess;
use crate::error::AppError;
use crate::model::{pages, Action, RolePermission, SiteConfig, SiteConfigInput};
use crate::response::{success_many, success_one_ok, SuccessMany, SuccessOne};
use crate::service::{DashboardService, DashboardStats, PermissionService, SiteService};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};

pub async fn dashboard(
    State(state): State<AppState>,
    access: TenantAccess,
) -> Result<(StatusCode, Json<SuccessOne<DashboardStats>>), AppError> {
    state.authorize(&access, pages::DASHBOARD, Action::View).await?;
    let stats = DashboardService::stats(&state.pool, access.tenant.id).await?;
    Ok(success_one_ok(stats))
}

pub async fn get_permissions(
    State(state): State<AppState>,
    access: TenantAccess,
) -> Result<(StatusCode, Json<SuccessMany<RolePermission>>), AppError> {
    state.authorize(&access, pages::PERMISSIONS, Action::View).await?;
    let table = state.permissions.get(state.access.as_ref()).await?;
    Ok(success_many(table.rows()))
}

/// PUT permissions with a list of rows; returns the grid as stored afterwards.
pub async fn put_permissions(
    State(state): State<AppState>,
    access: TenantAccess,
    Json(rows): Json<Vec<RolePermission>>,
) -> Result<(StatusCode, Json<SuccessMany<RolePermission>>), AppError> {
    state.authorize(&access, pages::PERMISSIONS, Action::Edit).await?;
    PermissionService::save_grid(&state.pool, &state.permissions, &rows).await?;
    let table = state.permissions.get(state.access.as_ref()).await?;
    Ok(success_many(table.rows()))
}

pub async fn get_site(
    State(state): State<AppState>,
    access: TenantAccess,
) -> Result<(StatusCode, Json<SuccessOne<Option<SiteConfig>>>), AppError> {
    state.authorize(&access, pages::SETTINGS, Action::View).await?;
    let config = SiteService::get(&state.pool, access.tenant.id).await?;
    Ok(success_one_ok(config))
}

pub async fn put_site(
    State(state): State<AppState>,
    access: TenantAccess,
    Json(body): Json<SiteConfigInput>,
) -> Result<(StatusCode, Json<SuccessOne<SiteConfig>>), AppError> {
    state.authorize(&access, pages::SETTINGS, Action::Edit).await?;
    let config = SiteService::upsert(&state.pool, access.tenant.id, &body).await?;
    Ok(success_one_ok(config))
}
