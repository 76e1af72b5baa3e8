//! Tenants, their domains and memberships.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// DNS label under which a tenant publishes its verification token.
pub const VERIFY_RECORD_PREFIX: &str = "_zatch-verify";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    Active,
    Inactive,
}

impl TenantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantStatus::Active => "active",
            TenantStatus::Inactive => "inactive",
        }
    }
}

impl std::str::FromStr for TenantStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(TenantStatus::Active),
            "inactive" => Ok(TenantStatus::Inactive),
            _ => Err(AppError::BadRequest(format!(
                "invalid tenant status: {} (expected active or inactive)",
                s
            ))),
        }
    }
}

/// One real-estate agency.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub status: TenantStatus,
    #[serde(default)]
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    pub fn new(name: impl Into<String>, slug: impl Into<String>, status: TenantStatus) -> Self {
        Tenant {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
            status,
            settings: serde_json::Value::Object(Default::default()),
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }
}

/// Which surface a hostname serves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainType {
    #[default]
    Admin,
    Public,
}

impl DomainType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainType::Admin => "admin",
            DomainType::Public => "public",
        }
    }
}

impl std::str::FromStr for DomainType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(DomainType::Admin),
            "public" => Ok(DomainType::Public),
            _ => Err(AppError::BadRequest(format!(
                "invalid domain type: {} (expected admin or public)",
                s
            ))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Domain {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Always lowercase.
    pub hostname: String,
    #[serde(rename = "type")]
    pub domain_type: DomainType,
    pub is_primary: bool,
    pub verified: bool,
    pub verify_token: String,
    pub created_at: DateTime<Utc>,
}

impl Domain {
    /// New, unverified domain with a freshly issued verification token.
    pub fn new(tenant_id: Uuid, hostname: &str, domain_type: DomainType) -> Self {
        Domain {
            id: Uuid::new_v4(),
            tenant_id,
            hostname: hostname.to_lowercase(),
            domain_type,
            is_primary: false,
            verified: false,
            verify_token: Uuid::new_v4().simple().to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn verification_record(&self) -> VerificationRecord {
        VerificationRecord {
            record_type: "TXT",
            name: verification_record_name(&self.hostname),
            value: self.verify_token.clone(),
        }
    }
}

/// TXT record name that proves ownership of `hostname`.
pub fn verification_record_name(hostname: &str) -> String {
    format!("{}.{}", VERIFY_RECORD_PREFIX, hostname)
}

/// DNS record a tenant owner must publish before the domain is marked verified.
#[derive(Clone, Debug, Serialize)]
pub struct VerificationRecord {
    pub record_type: &'static str,
    pub name: String,
    pub value: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Agent,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Owner, Role::Admin, Role::Agent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Agent => "agent",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "agent" => Ok(Role::Agent),
            _ => Err(AppError::BadRequest(format!(
                "invalid role: {} (expected owner, admin or agent)",
                s
            ))),
        }
    }
}

/// Membership of a user in a tenant. The role is the only authorization signal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantUser {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
}

/// Body for registering a hostname.
#[derive(Clone, Debug, Deserialize)]
pub struct NewDomain {
    pub hostname: String,
    #[serde(rename = "type", default)]
    pub domain_type: DomainType,
    #[serde(default)]
    pub is_primary: bool,
}

/// Body for granting or changing a member's role.
#[derive(Clone, Debug, Deserialize)]
pub struct MemberRole {
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_domain_is_lowercase_unverified_with_token() {
        let d = Domain::new(Uuid::new_v4(), "Painel.Example.COM", DomainType::Admin);
        assert_eq!(d.hostname, "painel.example.com");
        assert!(!d.verified);
        assert_eq!(d.verify_token.len(), 32);
        assert_eq!(
            d.verification_record().name,
            "_zatch-verify.painel.example.com"
        );
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("ACTIVE".parse::<TenantStatus>().unwrap(), TenantStatus::Active);
        assert_eq!("Public".parse::<DomainType>().unwrap(), DomainType::Public);
        assert_eq!("agent".parse::<Role>().unwrap(), Role::Agent);
        assert!("manager".parse::<Role>().is_err());
    }
}
