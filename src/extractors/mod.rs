//! Request extractors: hostname, cookies, forwarded user and gated tenant context.

pub mod tenant;
pub mod user;

pub use tenant::*;
pub use user::*;
