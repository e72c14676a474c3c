//! 请求日志中间件
//!
//! 每个请求在一个 `request` span 中执行，处理函数内部的日志也带上
//! request_id / path / user，结束时按状态码级别输出一行汇总。

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use super::REQUEST_ID_HEADER;
use crate::auth::CurrentUser;

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();

    // SetRequestId runs first, the fallback only matters when the layer is absent
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| req.uri().path(), MatchedPath::as_str)
        .to_string();
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .map(|u| format!("{}({})", u.user_code, u.id))
        .unwrap_or_else(|| "anonymous".to_string());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %path,
        user = %user,
    );

    async move {
        let response = next.run(req).await;
        let status = response.status().as_u16();
        let latency_ms = start.elapsed().as_millis() as u64;

        match status {
            500.. => tracing::warn!(status, latency_ms, "Request failed"),
            400..500 => tracing::warn!(status, latency_ms, "Request rejected"),
            _ => tracing::info!(status, latency_ms, "Request completed"),
        }
        response
    }
    .instrument(span)
    .await
}
