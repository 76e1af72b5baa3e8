//! Back-office listing management, CSV export and import.

use crate::access::TenantAccess;
use crate::error::AppError;
use crate::export::{parse_properties_csv, properties_csv};
use crate::model::{pages, Action, NewProperty, Property, PropertyFilter, PropertyPatch};
use crate::response::{csv_attachment, success_many, success_one, success_one_ok, SuccessMany, SuccessOne};
use crate::service::PropertyService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use uuid::Uuid;

type One = (StatusCode, Json<SuccessOne<Property>>);

pub async fn list(
    State(state): State<AppState>,
    access: TenantAccess,
    Query(filter): Query<PropertyFilter>,
) -> Result<(StatusCode, Json<SuccessMany<Property>>), AppError> {
    state.authorize(&access, pages::PROPERTIES, Action::View).await?;
    let rows = PropertyService::list(&state.pool, access.tenant.id, &filter).await?;
    Ok(success_many(rows))
}

pub async fn read(
    State(state): State<AppState>,
    access: TenantAccess,
    Path(id): Path<Uuid>,
) -> Result<One, AppError> {
    state.authorize(&access, pages::PROPERTIES, Action::View).await?;
    let property = PropertyService::get(&state.pool, access.tenant.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("property {}", id)))?;
    Ok(success_one_ok(property))
}

pub async fn create(
    State(state): State<AppState>,
    access: TenantAccess,
    Json(body): Json<NewProperty>,
) -> Result<One, AppError> {
    state.authorize(&access, pages::PROPERTIES, Action::Create).await?;
    let property = PropertyService::create(&state.pool, access.tenant.id, &body).await?;
    Ok(success_one(property))
}

pub async fn update(
    State(state): State<AppState>,
    access: TenantAccess,
    Path(id): Path<Uuid>,
    Json(body): Json<PropertyPatch>,
) -> Result<One, AppError> {
    state.authorize(&access, pages::PROPERTIES, Action::Edit).await?;
    let property = PropertyService::update(&state.pool, access.tenant.id, id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("property {}", id)))?;
    Ok(success_one_ok(property))
}

pub async fn delete(
    State(state): State<AppState>,
    access: TenantAccess,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.authorize(&access, pages::PROPERTIES, Action::Delete).await?;
    if !PropertyService::delete(&state.pool, access.tenant.id, id).await? {
        return Err(AppError::NotFound(format!("property {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn export_csv(State(state): State<AppState>, access: TenantAccess) -> Result<Response, AppError> {
    state.authorize(&access, pages::PROPERTIES, Action::View).await?;
    let rows = PropertyService::all_for_export(&state.pool, access.tenant.id).await?;
    let filename = format!("imoveis-{}.csv", access.tenant.slug);
    Ok(csv_attachment(&filename, properties_csv(&rows)))
}

/// POST properties/import with a CSV body. All rows are inserted or none.
pub async fn import_csv(
    State(state): State<AppState>,
    access: TenantAccess,
    body: String,
) -> Result<(StatusCode, Json<SuccessMany<Property>>), AppError> {
    state.authorize(&access, pages::PROPERTIES, Action::Create).await?;
    let items = parse_properties_csv(&body)?;
    if items.is_empty() {
        return Err(AppError::Validation("csv contains no rows".into()));
    }
    let created = PropertyService::import_many(&state.pool, access.tenant.id, &items).await?;
    let (_, json) = success_many(created);
    Ok((StatusCode::CREATED, json))
}
