//! Hostname, tenant cookie and gated tenant context from the request.

use crate::access::TenantAccess;
use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use uuid::Uuid;

/// Header set by reverse proxies with the original host.
pub const FORWARDED_HOST_HEADER: &str = "X-Forwarded-Host";

/// Cookie remembering the last resolved tenant id.
pub const ACTIVE_TENANT_COOKIE: &str = "active_tenant_id";

/// Session cookie issued by the auth layer.
pub const SESSION_COOKIE: &str = "zatch_session";

/// Host the visitor asked for: `X-Forwarded-Host` (first entry) over `Host`. Port included, not normalized.
pub fn request_host(headers: &HeaderMap) -> Option<String> {
    headers
        .get(FORWARDED_HOST_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .filter(|s| !s.trim().is_empty())
        .or_else(|| headers.get(header::HOST).and_then(|v| v.to_str().ok()))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Value of cookie `name` from every `Cookie` header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim().to_string())
}

/// Tenant id cached by an earlier resolution; ignored when not a UUID.
pub fn active_tenant_from_cookie(headers: &HeaderMap) -> Option<Uuid> {
    cookie_value(headers, ACTIVE_TENANT_COOKIE).and_then(|v| Uuid::parse_str(&v).ok())
}

pub fn active_tenant_cookie(tenant_id: Uuid) -> String {
    format!("{}={}; Path=/; Max-Age=31536000; SameSite=Lax", ACTIVE_TENANT_COOKIE, tenant_id)
}

pub fn expired_cookie(name: &str, http_only: bool) -> String {
    let flags = if http_only { "; HttpOnly" } else { "" };
    format!("{}=; Path=/; Max-Age=0; SameSite=Lax{}", name, flags)
}

/// Tenant context placed in request extensions by the gate middleware.
#[async_trait]
impl<S> FromRequestParts<S> for TenantAccess
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantAccess>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("tenant access not established".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_host_wins() {
        let mut h = HeaderMap::new();
        h.insert(header::HOST, HeaderValue::from_static("internal:8080"));
        assert_eq!(request_host(&h).as_deref(), Some("internal:8080"));
        h.insert(FORWARDED_HOST_HEADER, HeaderValue::from_static("painel.example.com, proxy"));
        assert_eq!(request_host(&h).as_deref(), Some("painel.example.com"));
    }

    #[test]
    fn blank_forwarded_host_falls_back_to_host() {
        let mut h = HeaderMap::new();
        h.insert(header::HOST, HeaderValue::from_static("painel.example.com"));
        h.insert(FORWARDED_HOST_HEADER, HeaderValue::from_static("  "));
        assert_eq!(request_host(&h).as_deref(), Some("painel.example.com"));
        h.insert(FORWARDED_HOST_HEADER, HeaderValue::from_static(", proxy"));
        assert_eq!(request_host(&h).as_deref(), Some("painel.example.com"));
    }

    #[test]
    fn cookies_are_found_across_headers() {
        let id = Uuid::new_v4();
        let mut h = HeaderMap::new();
        h.append(header::COOKIE, HeaderValue::from_static("a=1; zatch_session=abc"));
        h.append(header::COOKIE, HeaderValue::from_str(&format!("active_tenant_id={}", id)).unwrap());
        assert_eq!(cookie_value(&h, SESSION_COOKIE).as_deref(), Some("abc"));
        assert_eq!(active_tenant_from_cookie(&h), Some(id));
        assert_eq!(cookie_value(&h, "missing"), None);
    }

    #[test]
    fn garbage_tenant_cookie_is_ignored() {
        let mut h = HeaderMap::new();
        h.insert(header::COOKIE, HeaderValue::from_static("active_tenant_id=not-a-uuid"));
        assert_eq!(active_tenant_from_cookie(&h), None);
    }
}
