//! Link-preview page for a listing.

use crate::access::TenantAccess;
use crate::error::AppError;
use crate::extractors::request_host;
use crate::og::{canonical_host, canonical_property_url, render_property_page};
use crate::service::{DomainService, PropertyService, SiteService};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Html,
};

/// GET /og/property/:key. The canonical URL points at the tenant's primary public domain,
/// falling back to the hostname the crawler used. No usable host is a 404.
pub async fn property_page(
    State(state): State<AppState>,
    access: TenantAccess,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Result<Html<String>, AppError> {
    let tenant_id = access.tenant.id;
    let property = PropertyService::get_by_key(&state.pool, tenant_id, &key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("property {}", key)))?;
    let (site, primary) = tokio::try_join!(
        SiteService::get(&state.pool, tenant_id),
        DomainService::primary_public_hostname(&state.pool, tenant_id),
    )?;
    let requested = request_host(&headers);
    let host = canonical_host(
        primary,
        access.domain.as_ref().map(|d| d.hostname.as_str()),
        requested.as_deref(),
    )
    .ok_or_else(|| AppError::NotFound(format!("no public hostname for property {}", key)))?;
    let url = canonical_property_url(&host, &property.slug);
    Ok(Html(render_property_page(&property, site.as_ref(), &url)))
}
