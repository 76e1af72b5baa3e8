//! HTTP handlers. Admin handlers check the permission grid before touching data.

pub mod domains;
pub mod gate;
pub mod members;
pub mod messages;
pub mod og;
pub mod properties;
pub mod public;
pub mod settings;
