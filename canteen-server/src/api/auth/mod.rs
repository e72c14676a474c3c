//! Authentication Routes
//!
//! | 路径 | 方法 | 认证 | 限流 |
//! |------|------|------|------|
//! | /api/auth/qr/scan | POST | 无 | 10 / 15 min |
//! | /api/auth/qr/verify-pin | POST | QR ticket | 5 / 15 min |
//! | /api/auth/login | POST | 无 | 10 / 15 min |
//! | /api/auth/refresh | POST | access token | 10 / 15 min |
//! | /api/auth/me | GET | access token | - |

mod handler;

use axum::{Router, middleware, routing::get, routing::post};

use crate::auth::rate_limit::{auth_rate_limit, pin_rate_limit};
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    Router::new().nest("/api/auth", routes(state))
}

fn routes(state: &ServerState) -> Router<ServerState> {
    let pin_routes = Router::new()
        .route("/qr/verify-pin", post(handler::verify_pin))
        .route_layer(middleware::from_fn_with_state(state.clone(), pin_rate_limit));

    let limited_routes = Router::new()
        .route("/qr/scan", post(handler::scan_qr))
        .route("/login", post(handler::login))
        .route("/refresh", post(handler::refresh))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_rate_limit));

    Router::new()
        .route("/me", get(handler::me))
        .merge(pin_routes)
        .merge(limited_routes)
}
