//! Notification Routes
//!
//! | 路径 | 方法 | 权限 |
//! |------|------|------|
//! | /api/notifications | GET | 登录用户 (?unreadOnly&page&limit) |
//! | /api/notifications/read-all | PUT | 登录用户 |
//! | /api/notifications/{id}/read | PUT | 登录用户 |
//! | /api/notifications/{id} | DELETE | 登录用户 |
//! | /api/notifications/settings | GET / PUT | 登录用户 |
//! | /api/notifications/send | POST | SendNotifications |
//! | /api/notifications/stats | GET | SendNotifications |

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::auth::{Capability, require_capability};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/notifications", routes())
}

fn routes() -> Router<ServerState> {
    let admin_routes = Router::new()
        .route("/send", post(handler::send))
        .route("/stats", get(handler::stats))
        .route_layer(middleware::from_fn(require_capability(
            Capability::SendNotifications,
        )));

    Router::new()
        .route("/", get(handler::list))
        .route("/read-all", put(handler::mark_all_read))
        .route("/settings", get(handler::get_settings).put(handler::update_settings))
        .route("/{id}/read", put(handler::mark_read))
        .route("/{id}", delete(handler::delete))
        .merge(admin_routes)
}
