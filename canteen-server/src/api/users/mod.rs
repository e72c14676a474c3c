//! User Management Routes
//!
//! | 路径 | 方法 | 权限 |
//! |------|------|------|
//! | /api/users | GET | ManageUsers |
//! | /api/users | POST | ManageUsers |
//! | /api/users/{id} | PUT | ManageUsers |
//! | /api/users/{user_code}/qr | POST | ManageUsers |
//! | /api/users/profile | GET | 登录用户 |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::{Capability, require_capability};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/users", routes())
}

fn routes() -> Router<ServerState> {
    let admin_routes = Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", put(handler::update))
        .route("/{user_code}/qr", post(handler::regenerate_qr))
        .route_layer(middleware::from_fn(require_capability(
            Capability::ManageUsers,
        )));

    Router::new()
        .route("/profile", get(handler::profile))
        .merge(admin_routes)
}
