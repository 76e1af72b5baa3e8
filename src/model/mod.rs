//! Domain records shared by the store, services and handlers.

pub mod message;
pub mod permission;
pub mod property;
pub mod site;
pub mod tenant;

pub use message::*;
pub use permission::*;
pub use property::*;
pub use site::*;
pub use tenant::*;
