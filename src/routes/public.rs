//! Storefront routes behind the public gate.

use crate::handlers::{gate, og, public};
use crate::middleware::public_gate;
use crate::state::AppState;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

pub fn public_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/gate", get(gate::gate_info))
        .route("/api/v1/site", get(public::site))
        .route("/api/v1/properties", get(public::list_properties))
        .route("/api/v1/properties/:slug", get(public::property_detail))
        .route("/api/v1/contact", post(public::contact))
        .route("/og/property/:key", get(og::property_page))
        .route_layer(from_fn_with_state(state.clone(), public_gate))
        .with_state(state)
}
