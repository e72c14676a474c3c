//! Per-IP fixed-window rate limiting for login and ordering routes

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::core::ServerState;
use crate::security_log;
use shared::AppError;

/// A named bucket: at most `max_requests` per `window`
#[derive(Debug, Clone, Copy)]
pub struct RateRule {
    pub route: &'static str,
    pub max_requests: u32,
    pub window: Duration,
}

pub const PIN_RULE: RateRule = RateRule {
    route: "pin",
    max_requests: 5,
    window: Duration::from_secs(15 * 60),
};

pub const AUTH_RULE: RateRule = RateRule {
    route: "auth",
    max_requests: 10,
    window: Duration::from_secs(15 * 60),
};

pub const ORDER_RULE: RateRule = RateRule {
    route: "orders",
    max_requests: 5,
    window: Duration::from_secs(60),
};

struct IpEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    /// route name -> (IP -> entry)
    inner: Arc<Mutex<HashMap<&'static str, HashMap<String, IpEntry>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the request is allowed, `false` if rate-limited.
    pub async fn check(&self, rule: RateRule, ip: &str) -> bool {
        let mut map = self.inner.lock().await;
        let route_map = map.entry(rule.route).or_default();
        let now = Instant::now();

        let entry = route_map.entry(ip.to_owned()).or_insert_with(|| IpEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= rule.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count <= rule.max_requests
    }

    /// Drop entries whose window started more than `max_age` ago
    pub async fn cleanup(&self, max_age: Duration) {
        let mut map = self.inner.lock().await;
        let now = Instant::now();

        for route_map in map.values_mut() {
            route_map.retain(|_, entry| now.duration_since(entry.window_start) < max_age);
        }
        map.retain(|_, route_map| !route_map.is_empty());
    }

    /// Periodic cleanup until the runtime shuts down
    pub fn spawn_cleanup(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                // Longest window is 15 minutes
                limiter.cleanup(AUTH_RULE.window).await;
            }
        })
    }
}

/// Client IP: first `X-Forwarded-For` entry, then the peer address
pub fn extract_ip(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let ip = first.trim();
        if !ip.is_empty() {
            return ip.to_owned();
        }
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

async fn enforce(
    state: &ServerState,
    rule: RateRule,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = extract_ip(&request);
    if !state.rate_limiter.check(rule, &ip).await {
        security_log!(
            "WARN",
            "rate_limited",
            route = rule.route,
            ip = ip,
            path = request.uri().path().to_string()
        );
        return Err(AppError::rate_limited());
    }
    Ok(next.run(request).await)
}

/// PIN verification: 5 per 15 minutes per IP
pub async fn pin_rate_limit(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state, PIN_RULE, request, next).await
}

/// Other auth endpoints: 10 per 15 minutes per IP
pub async fn auth_rate_limit(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state, AUTH_RULE, request, next).await
}

/// Order placement: 5 per minute per IP
pub async fn order_rate_limit(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state, ORDER_RULE, request, next).await
}
