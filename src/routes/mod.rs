//! Routers per surface and the assembled application.

mod admin;
mod auth;
mod common;
mod public;

pub use admin::{admin_routes, ADMIN_PREFIX};
pub use auth::auth_routes;
pub use common::common_routes;
pub use public::public_routes;

use crate::state::AppState;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

/// Every surface merged, with the request-body limit from settings.
pub fn app(state: AppState) -> Router {
    let max_body = state.settings.max_body_bytes;
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(auth_routes())
        .merge(admin_routes(state.clone()))
        .merge(public_routes(state))
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(max_body)))
}
