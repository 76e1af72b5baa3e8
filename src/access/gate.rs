//! Access gate: resolution plus membership, decided once per request.
//!
//! `Loading` is the only non-terminal state. Once evaluated the gate never re-runs; a
//! blocked visitor has to reload after fixing the cause.

use crate::access::screen::GateScreen;
use crate::access::{normalize_hostname, AccessStore, HostnameResolver, PermissionTable, ResolutionSource};
use crate::error::{AppError, ResolutionError};
use crate::model::{Action, Domain, DomainType, Role, Tenant, TenantUser};
use uuid::Uuid;

/// Tenant context handed to handlers once the gate lets a request through.
#[derive(Clone, Debug)]
pub struct TenantAccess {
    pub tenant: Tenant,
    pub domain: Option<Domain>,
    pub source: ResolutionSource,
    pub user_id: Option<Uuid>,
    /// Only ever a membership of `tenant`.
    pub membership: Option<TenantUser>,
}

impl TenantAccess {
    pub fn is_member(&self) -> bool {
        self.membership.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.membership.as_ref().map(|m| m.role)
    }

    pub fn can(&self, table: &PermissionTable, page_key: &str, action: Action) -> bool {
        self.role()
            .map(|role| table.can_access(role, page_key, action))
            .unwrap_or(false)
    }

    pub fn require(&self, table: &PermissionTable, page_key: &str, action: Action) -> Result<(), AppError> {
        if self.can(table, page_key, action) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "{} on {} is not allowed for this role",
                action.as_str(),
                page_key
            )))
        }
    }
}

#[derive(Clone, Debug)]
pub enum GateState {
    Loading,
    Granted(TenantAccess),
    /// Admin surface reached without an authenticated user.
    LoginRequired { tenant: Tenant },
    NotMember { tenant: Tenant, user_id: Uuid },
    Blocked { error: ResolutionError, hostname: String },
}

impl GateState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GateState::Loading)
    }

    /// Blocking screen for every terminal state except `Granted`.
    pub fn screen(&self) -> Option<GateScreen> {
        match self {
            GateState::Loading | GateState::Granted(_) => None,
            GateState::LoginRequired { .. } => Some(GateScreen::LoginRequired),
            GateState::NotMember { .. } => Some(GateScreen::NotMember),
            GateState::Blocked { error, hostname } => Some(GateScreen::for_resolution(*error, hostname)),
        }
    }
}

pub struct AccessGate {
    hostname: String,
    domain_type: DomainType,
    state: GateState,
}

impl AccessGate {
    pub fn new(hostname: impl Into<String>, domain_type: DomainType) -> Self {
        AccessGate {
            hostname: hostname.into(),
            domain_type,
            state: GateState::Loading,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn into_state(self) -> GateState {
        self.state
    }

    /// Runs resolution and the membership check. A no-op once terminal.
    pub async fn evaluate(
        &mut self,
        resolver: &HostnameResolver<'_>,
        store: &dyn AccessStore,
        user_id: Option<Uuid>,
        cached_tenant_id: Option<Uuid>,
    ) -> &GateState {
        if !self.state.is_terminal() {
            self.state = self.decide(resolver, store, user_id, cached_tenant_id).await;
        }
        &self.state
    }

    async fn decide(
        &self,
        resolver: &HostnameResolver<'_>,
        store: &dyn AccessStore,
        user_id: Option<Uuid>,
        cached_tenant_id: Option<Uuid>,
    ) -> GateState {
        let resolved = match resolver.resolve(&self.hostname, self.domain_type, cached_tenant_id).await {
            Ok(r) => r,
            Err(error) => {
                return GateState::Blocked {
                    error,
                    hostname: normalize_hostname(&self.hostname),
                }
            }
        };
        let membership = match user_id {
            Some(uid) => match store.find_membership(resolved.tenant.id, uid).await {
                Ok(m) => m.filter(|m| m.tenant_id == resolved.tenant.id && m.user_id == uid),
                Err(e) => {
                    tracing::warn!(tenant_id = %resolved.tenant.id, error = %e, "membership lookup failed");
                    return GateState::Blocked {
                        error: ResolutionError::Lookup,
                        hostname: normalize_hostname(&self.hostname),
                    };
                }
            },
            None => None,
        };
        match (self.domain_type, user_id, membership) {
            (DomainType::Admin, None, _) => GateState::LoginRequired { tenant: resolved.tenant },
            (DomainType::Admin, Some(uid), None) => GateState::NotMember {
                tenant: resolved.tenant,
                user_id: uid,
            },
            (_, user_id, membership) => GateState::Granted(TenantAccess {
                tenant: resolved.tenant,
                domain: resolved.domain,
                source: resolved.source,
                user_id,
                membership,
            }),
        }
    }
}
