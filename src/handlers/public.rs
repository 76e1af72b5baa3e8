//! Storefront API: site settings, listing search, listing detail, contact form.

use crate::access::TenantAccess;
use crate::error::AppError;
use crate::model::{ContactMessage, NewContactMessage, Property, PropertyFilter, SiteConfig};
use crate::response::{success_many, success_one, success_one_ok, SuccessMany, SuccessOne};
use crate::service::{MessageService, PropertyService, SiteService};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct PublicSite {
    pub tenant_name: String,
    pub tenant_slug: String,
    pub config: Option<SiteConfig>,
}

pub async fn site(
    State(state): State<AppState>,
    access: TenantAccess,
) -> Result<(StatusCode, Json<SuccessOne<PublicSite>>), AppError> {
    let config = SiteService::get(&state.pool, access.tenant.id).await?;
    Ok(success_one_ok(PublicSite {
        tenant_name: access.tenant.name,
        tenant_slug: access.tenant.slug,
        config,
    }))
}

pub async fn list_properties(
    State(state): State<AppState>,
    access: TenantAccess,
    Query(filter): Query<PropertyFilter>,
) -> Result<(StatusCode, Json<SuccessMany<Property>>), AppError> {
    let rows = PropertyService::list(&state.pool, access.tenant.id, &filter).await?;
    Ok(success_many(rows))
}

pub async fn property_detail(
    State(state): State<AppState>,
    access: TenantAccess,
    Path(slug): Path<String>,
) -> Result<(StatusCode, Json<SuccessOne<Property>>), AppError> {
    let property = PropertyService::get_by_slug(&state.pool, access.tenant.id, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("property {}", slug)))?;
    Ok(success_one_ok(property))
}

pub async fn contact(
    State(state): State<AppState>,
    access: TenantAccess,
    Json(body): Json<NewContactMessage>,
) -> Result<(StatusCode, Json<SuccessOne<ContactMessage>>), AppError> {
    let message = MessageService::create(&state.pool, access.tenant.id, &body).await?;
    Ok(success_one(message))
}
