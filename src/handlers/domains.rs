//! Domain registration and primary selection.

use crate::access::TenantAccess;
use crate::error::AppError;
use crate::model::{pages, Action, Domain, NewDomain};
use crate::response::{success_many, success_one, success_one_ok, SuccessMany, SuccessOne};
use crate::service::{DomainService, RegisteredDomain};
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
) -> Result<(StatusCode, Json<SuccessMany<Domain>>), AppError> {
    state.authorize(&access, pages::DOMAINS, Action::View).await?;
    let rows = DomainService::list(&state.pool, access.tenant.id).await?;
    Ok(success_many(rows))
}

/// 201 with the domain and the TXT record to publish.
pub async fn create(
    State(state): State<AppState>,
    access: TenantAccess,
    Json(body): Json<NewDomain>,
) -> Result<(StatusCode, Json<SuccessOne<RegisteredDomain>>), AppError> {
    state.authorize(&access, pages::DOMAINS, Action::Create).await?;
    let registered = DomainService::create(&state.pool, access.tenant.id, &body).await?;
    Ok(success_one(registered))
}

pub async fn delete(
    State(state): State<AppState>,
    access: TenantAccess,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.authorize(&access, pages::DOMAINS, Action::Delete).await?;
    if access.domain.as_ref().map(|d| d.id) == Some(id) {
        return Err(AppError::Conflict("cannot remove the domain serving this request".into()));
    }
    if !DomainService::delete(&state.pool, access.tenant.id, id).await? {
        return Err(AppError::NotFound(format!("domain {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_primary(
    State(state): State<AppState>,
    access: TenantAccess,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<SuccessOne<Domain>>), AppError> {
    state.authorize(&access, pages::DOMAINS, Action::Edit).await?;
    let domain = DomainService::set_primary(&state.pool, access.tenant.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("domain {}", id)))?;
    Ok(success_one_ok(domain))
}
