//! Wallet Routes
//!
//! `/api/wallet/verify-payment` is called by the payment provider and is
//! authenticated by its HMAC signature instead of a JWT.

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{Capability, require_capability};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/wallet", routes())
}

fn routes() -> Router<ServerState> {
    let admin_routes = Router::new()
        .route("/recharge", post(handler::recharge))
        .route_layer(middleware::from_fn(require_capability(
            Capability::RechargeWallet,
        )));

    Router::new()
        .route("/balance", get(handler::balance))
        .route("/transactions", get(handler::transactions))
        .route("/upi-request", post(handler::upi_request))
        .route("/verify-payment", post(handler::verify_payment))
        .merge(admin_routes)
}
