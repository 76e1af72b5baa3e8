//! Gate middleware: resolves the tenant for every request on a surface and either
//! forwards it with `TenantAccess` in the extensions or answers with the blocking screen.

use crate::access::{AccessGate, GateScreen, GateState, HostnameResolver};
use crate::extractors::{active_tenant_cookie, active_tenant_from_cookie, request_host, user_id_from_headers};
use crate::model::DomainType;
use crate::response::error_body;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    Json,
};

/// Back-office routes: resolved admin domain and a tenant member.
pub async fn admin_gate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    run_gate(state, DomainType::Admin, req, next).await
}

/// Storefront routes: resolved public domain, anonymous visitors allowed.
pub async fn public_gate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    run_gate(state, DomainType::Public, req, next).await
}

async fn run_gate(state: AppState, domain_type: DomainType, mut req: Request, next: Next) -> Response {
    let headers = req.headers();
    let host = request_host(headers).unwrap_or_default();
    let user_id = user_id_from_headers(headers);
    let cached_tenant_id = active_tenant_from_cookie(headers);
    let wants_html = accepts_html(headers);

    let resolver = HostnameResolver::new(state.access.as_ref(), state.settings.env);
    let mut gate = AccessGate::new(host, domain_type);
    gate.evaluate(&resolver, state.access.as_ref(), user_id, cached_tenant_id)
        .await;

    match gate.into_state() {
        GateState::Granted(access) => {
            let tenant_id = access.tenant.id;
            req.extensions_mut().insert(access);
            let mut res = next.run(req).await;
            if cached_tenant_id != Some(tenant_id) {
                if let Ok(v) = HeaderValue::from_str(&active_tenant_cookie(tenant_id)) {
                    res.headers_mut().append(header::SET_COOKIE, v);
                }
            }
            res
        }
        other => match other.screen() {
            Some(screen) => screen_response(&screen, wants_html),
            None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        },
    }
}

/// HTML page for browsers, JSON error envelope for API clients.
pub fn screen_response(screen: &GateScreen, html: bool) -> Response {
    if html {
        (screen.status(), Html(screen.render_html())).into_response()
    } else {
        (
            screen.status(),
            Json(error_body(screen.code(), screen.message(), screen.details())),
        )
            .into_response()
    }
}

fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false)
}
