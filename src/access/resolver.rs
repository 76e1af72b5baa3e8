//! Hostname → tenant resolution.
//!
//! Domain lookups are typed (`admin` / `public`). A miss is retried without the type so a
//! hostname registered for the other surface reports `WRONG_DOMAIN_TYPE` instead of
//! `DOMAIN_NOT_FOUND`. Store failures never escape: they become `RESOLUTION_ERROR`.

use crate::access::AccessStore;
use crate::error::{AppError, ResolutionError};
use crate::model::{Domain, DomainType, Tenant};
use crate::settings::RuntimeEnv;
use serde::Serialize;
use uuid::Uuid;

/// How the tenant was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Domain,
    /// Development only: tenant id remembered from an earlier resolution.
    CachedTenant,
    /// Development only: no usable cached id, oldest active tenant picked.
    FirstActiveTenant,
}

#[derive(Clone, Debug, Serialize)]
pub struct ResolvedTenant {
    pub tenant: Tenant,
    pub domain: Option<Domain>,
    pub source: ResolutionSource,
}

pub struct HostnameResolver<'a> {
    store: &'a dyn AccessStore,
    env: RuntimeEnv,
}

impl<'a> HostnameResolver<'a> {
    pub fn new(store: &'a dyn AccessStore, env: RuntimeEnv) -> Self {
        HostnameResolver { store, env }
    }

    /// Resolve `hostname` for the given surface. `cached_tenant_id` is only consulted by the
    /// development fallback on local hostnames.
    pub async fn resolve(
        &self,
        hostname: &str,
        domain_type: DomainType,
        cached_tenant_id: Option<Uuid>,
    ) -> Result<ResolvedTenant, ResolutionError> {
        let hostname = normalize_hostname(hostname);
        let outcome = if self.env == RuntimeEnv::Development && is_local_host(&hostname) {
            self.resolve_fallback(cached_tenant_id).await
        } else {
            self.resolve_domain(&hostname, domain_type).await
        };
        match outcome {
            Ok(Ok(resolved)) => {
                tracing::debug!(
                    hostname = %hostname,
                    tenant_id = %resolved.tenant.id,
                    source = ?resolved.source,
                    "tenant resolved"
                );
                Ok(resolved)
            }
            Ok(Err(e)) => {
                tracing::info!(hostname = %hostname, domain_type = domain_type.as_str(), code = e.code(), "tenant resolution refused");
                Err(e)
            }
            Err(e) => {
                tracing::warn!(hostname = %hostname, error = %e, "tenant resolution lookup failed");
                Err(ResolutionError::Lookup)
            }
        }
    }

    async fn resolve_domain(
        &self,
        hostname: &str,
        domain_type: DomainType,
    ) -> Result<Result<ResolvedTenant, ResolutionError>, AppError> {
        if hostname.is_empty() {
            return Ok(Err(ResolutionError::DomainNotFound));
        }
        let domain = match self.store.find_domain(hostname, Some(domain_type)).await? {
            Some(d) => d,
            None => {
                let other = self.store.find_domain(hostname, None).await?;
                return Ok(Err(match other {
                    Some(_) => ResolutionError::WrongDomainType,
                    None => ResolutionError::DomainNotFound,
                }));
            }
        };
        if !domain.verified {
            return Ok(Err(ResolutionError::DomainNotVerified));
        }
        let tenant = match self.store.find_tenant(domain.tenant_id).await? {
            Some(t) => t,
            None => return Ok(Err(ResolutionError::TenantNotFound)),
        };
        if !tenant.is_active() {
            return Ok(Err(ResolutionError::TenantInactive));
        }
        Ok(Ok(ResolvedTenant {
            tenant,
            domain: Some(domain),
            source: ResolutionSource::Domain,
        }))
    }

    async fn resolve_fallback(
        &self,
        cached_tenant_id: Option<Uuid>,
    ) -> Result<Result<ResolvedTenant, ResolutionError>, AppError> {
        if let Some(id) = cached_tenant_id {
            if let Some(tenant) = self.store.find_tenant(id).await? {
                if tenant.is_active() {
                    return Ok(Ok(ResolvedTenant {
                        tenant,
                        domain: None,
                        source: ResolutionSource::CachedTenant,
                    }));
                }
            }
        }
        Ok(match self.store.first_active_tenant().await? {
            Some(tenant) => Ok(ResolvedTenant {
                tenant,
                domain: None,
                source: ResolutionSource::FirstActiveTenant,
            }),
            None => Err(ResolutionError::NoTenantAvailable),
        })
    }
}

/// Lowercase, trim, drop the port and any trailing dot. `[::1]:3000` becomes `::1`.
pub fn normalize_hostname(raw: &str) -> String {
    let s = raw.trim();
    let host = if let Some(rest) = s.strip_prefix('[') {
        rest.split(']').next().unwrap_or("")
    } else if s.matches(':').count() == 1 {
        s.split(':').next().unwrap_or("")
    } else {
        s
    };
    host.trim_end_matches('.').to_lowercase()
}

/// Hostnames the development fallback applies to.
pub fn is_local_host(hostname: &str) -> bool {
    matches!(hostname, "localhost" | "127.0.0.1" | "::1" | "0.0.0.0") || hostname.ends_with(".localhost")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostnames_are_normalized() {
        assert_eq!(normalize_hostname(" Painel.Example.COM:8080 "), "painel.example.com");
        assert_eq!(normalize_hostname("example.com."), "example.com");
        assert_eq!(normalize_hostname("[::1]:3000"), "::1");
        assert_eq!(normalize_hostname("::1"), "::1");
        assert_eq!(normalize_hostname(""), "");
    }

    #[test]
    fn local_hosts_are_recognized() {
        assert!(is_local_host("localhost"));
        assert!(is_local_host("admin.localhost"));
        assert!(is_local_host("127.0.0.1"));
        assert!(!is_local_host("localhost.example.com"));
    }
}
