//! Catalog Routes
//!
//! Menu reads are open to every logged-in user, writes need `ManageCatalog`.

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::{Capability, require_capability};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/items", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/categories", get(handler::menu));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/categories", post(handler::create_category))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route_layer(middleware::from_fn(require_capability(
            Capability::ManageCatalog,
        )));

    read_routes.merge(manage_routes)
}
