//! Gate introspection and logout.

use crate::access::{ResolutionSource, TenantAccess};
use crate::error::AppError;
use crate::extractors::{expired_cookie, ACTIVE_TENANT_COOKIE, SESSION_COOKIE};
use crate::model::{Action, Domain, Role, Tenant};
use crate::response::{success_one_ok, SuccessOne};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// What the client needs to render past the gate: the tenant, the caller's role and the
/// actions that role may take per page.
#[derive(Serialize)]
pub struct GateInfo {
    pub status: &'static str,
    pub tenant: Tenant,
    pub domain: Option<Domain>,
    pub source: ResolutionSource,
    pub user_id: Option<Uuid>,
    pub is_member: bool,
    pub role: Option<Role>,
    pub permissions: BTreeMap<String, Vec<Action>>,
}

/// GET gate: always `granted` here, blocked requests never reach the handler.
pub async fn gate_info(
    State(state): State<AppState>,
    access: TenantAccess,
) -> Result<(StatusCode, Json<SuccessOne<GateInfo>>), AppError> {
    let permissions = match access.role() {
        Some(role) => state.permissions.get(state.access.as_ref()).await?.grants_for(role),
        None => BTreeMap::new(),
    };
    Ok(success_one_ok(GateInfo {
        status: "granted",
        is_member: access.is_member(),
        role: access.role(),
        user_id: access.user_id,
        source: access.source,
        domain: access.domain,
        tenant: access.tenant,
        permissions,
    }))
}

/// POST /auth/logout: drop the session and the remembered tenant, then reload from `/`.
pub async fn logout() -> Response {
    let mut res = (StatusCode::SEE_OTHER, [(header::LOCATION, "/")]).into_response();
    for cookie in [
        expired_cookie(SESSION_COOKIE, true),
        expired_cookie(ACTIVE_TENANT_COOKIE, false),
    ] {
        if let Ok(v) = HeaderValue::from_str(&cookie) {
            res.headers_mut().append(header::SET_COOKIE, v);
        }
    }
    tracing::debug!("logout");
    res
}
