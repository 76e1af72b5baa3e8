//! Tenant resolution, access gating and role permissions.

pub mod gate;
pub mod memory;
pub mod permissions;
pub mod resolver;
pub mod screen;
pub mod store;

pub use gate::{AccessGate, GateState, TenantAccess};
pub use memory::MemoryAccessStore;
pub use permissions::{PermissionCache, PermissionTable};
pub use resolver::{is_local_host, normalize_hostname, HostnameResolver, ResolutionSource, ResolvedTenant};
pub use screen::GateScreen;
pub use store::{AccessStore, PgAccessStore};
