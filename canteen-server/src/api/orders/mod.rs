//! Order Routes
//!
//! | 路径 | 方法 | 权限 | 限流 |
//! |------|------|------|------|
//! | /api/orders | POST | PlaceOrder | 5 / min |
//! | /api/orders/my-orders | GET | 登录用户 | - |
//! | /api/orders | GET | ViewOrderQueue | - |
//! | /api/orders/{id} | GET | owner or ViewOrderQueue | - |
//! | /api/orders/{id}/status | PUT | AdvanceOrder | - |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::rate_limit::order_rate_limit;
use crate::auth::{Capability, require_capability};
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    Router::new().nest("/api/orders", routes(state))
}

fn routes(state: &ServerState) -> Router<ServerState> {
    let place_routes = Router::new()
        .route("/", post(handler::place))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            order_rate_limit,
        ));

    let queue_routes = Router::new()
        .route("/", get(handler::queue))
        .route_layer(middleware::from_fn(require_capability(
            Capability::ViewOrderQueue,
        )));

    Router::new()
        .route("/my-orders", get(handler::my_orders))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", put(handler::update_status))
        .merge(place_routes)
        .merge(queue_routes)
}
