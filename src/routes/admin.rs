//! Back-office API behind the admin gate. Mounted under `/admin/api/v1`.

use crate::handlers::{domains, gate, members, messages, properties, settings};
use crate::middleware::admin_gate;
use crate::state::AppState;
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post, put},
    Router,
};

pub const ADMIN_PREFIX: &str = "/admin/api/v1";

pub fn admin_routes(state: AppState) -> Router {
    let api = Router::new()
        .route("/gate", get(gate::gate_info))
        .route("/dashboard", get(settings::dashboard))
        .route("/properties", get(properties::list).post(properties::create))
        .route("/properties/export.csv", get(properties::export_csv))
        .route("/properties/import", post(properties::import_csv))
        .route(
            "/properties/:id",
            get(properties::read).patch(properties::update).delete(properties::delete),
        )
        .route("/messages", get(messages::list))
        .route("/messages/export.csv", get(messages::export_csv))
        .route("/messages/:id", patch(messages::update).delete(messages::delete))
        .route("/domains", get(domains::list).post(domains::create))
        .route("/domains/:id", delete(domains::delete))
        .route("/domains/:id/primary", post(domains::set_primary))
        .route("/members", get(members::list))
        .route("/members/:user_id", put(members::put).delete(members::delete))
        .route("/permissions", get(settings::get_permissions).put(settings::put_permissions))
        .route("/site", get(settings::get_site).put(settings::put_site))
        .route_layer(from_fn_with_state(state.clone(), admin_gate))
        .with_state(state);
    Router::new().nest(ADMIN_PREFIX, api)
}
