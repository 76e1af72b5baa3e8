//! Zatch backend: multi-tenant real-estate storefront and admin API on PostgreSQL.
//!
//! Every request is resolved from its hostname to a tenant, gated on domain verification,
//! tenant status and (on the admin surface) membership, then served with a `TenantAccess`.

pub mod access;
pub mod csv;
pub mod error;
pub mod export;
pub mod extractors;
pub mod handlers;
pub mod html;
pub mod middleware;
pub mod model;
pub mod og;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod state;
pub mod store;

pub use access::{AccessGate, AccessStore, GateState, HostnameResolver, MemoryAccessStore, PgAccessStore, TenantAccess};
pub use error::{AppError, ResolutionError};
pub use response::{error_body, success_many, success_one};
pub use routes::{admin_routes, app, auth_routes, common_routes, public_routes};
pub use settings::{init_tracing, RuntimeEnv, Settings};
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_tables};
