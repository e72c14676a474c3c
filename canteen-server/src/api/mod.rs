//! API 路由模块
//!
//! - [`health`] - 健康检查
//! - [`auth`] - QR 登录、密码登录、令牌刷新
//! - [`users`] - 用户管理
//! - [`items`] - 菜单与菜品管理
//! - [`orders`] - 下单与订单状态
//! - [`wallet`] - 钱包、充值与支付回调
//! - [`notifications`] - 站内通知

pub mod auth;
pub mod health;
pub mod items;
pub mod logging;
pub mod notifications;
pub mod orders;
pub mod users;
pub mod wallet;

use std::time::Duration;

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue, StatusCode};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::require_auth;
use crate::core::ServerState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware)
///
/// Auth and order routes carry per-IP rate limits, which need the state.
pub fn build_router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        // Health API - public route
        .merge(health::router())
        // Auth API - public login endpoints plus refresh/me
        .merge(auth::router(state))
        .merge(users::router())
        .merge(items::router())
        .merge(orders::router(state))
        // Wallet API - verify-payment is signed, not authenticated
        .merge(wallet::router())
        .merge(notifications::router())
}

/// Build a fully configured application with all middleware
///
/// Used by the HTTP server and by in-process tests (`oneshot`).
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let timeout = Duration::from_millis(state.config.request_timeout_ms);

    build_router(state)
        // ========== Tower HTTP Middleware ==========
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(axum_middleware::from_fn(logging::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        // ========== Application Middleware ==========
        // Set is added last so it runs first; Propagate copies the id to the response
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, XRequestId))
        // JWT authentication - injects CurrentUser, skips public routes
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ))
}
