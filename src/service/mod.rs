//! Tenant-scoped persistence services. Every call takes the tenant id from the gate.

mod dashboard;
mod domains;
mod members;
mod messages;
mod permissions;
mod properties;
mod site;

pub use dashboard::{DashboardService, DashboardStats};
pub use domains::{validate_hostname, DomainService, RegisteredDomain};
pub use members::{check_role_change, MemberService};
pub use messages::{MessageQuery, MessageService};
pub use permissions::PermissionService;
pub use properties::PropertyService;
pub use site::SiteService;
