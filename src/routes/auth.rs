//! Session routes. Sign-in belongs to the upstream auth layer; only logout lives here.

use crate::handlers::gate::logout;
use axum::{routing::post, Router};

pub fn auth_routes() -> Router {
    Router::new().route("/auth/logout", post(logout))
}
