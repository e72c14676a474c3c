//! 认证中间件
//!
//! Axum middleware for JWT authentication and capability checks.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::AppError;

use crate::auth::extractor::authenticate;
use crate::auth::{Capability, CurrentUser};
use crate::core::ServerState;
use crate::security_log;

/// API routes reachable without an access token
pub const PUBLIC_API_ROUTES: &[&str] = &[
    "/api/auth/qr/scan",
    "/api/auth/qr/verify-pin",
    "/api/auth/login",
    "/api/wallet/verify-payment",
];

/// 认证中间件 - 要求用户登录
///
/// Validates `Authorization: Bearer <token>` and inserts [`CurrentUser`]
/// into the request extensions.
///
/// # 跳过认证的路径
///
/// - `OPTIONS *` (CORS preflight)
/// - non `/api/` paths (`/health`, unknown routes fall through to 404)
/// - [`PUBLIC_API_ROUTES`]
///
/// QR login tickets are rejected here: only `access` tokens pass.
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }
    if !path.starts_with("/api/") || PUBLIC_API_ROUTES.contains(&path) {
        return Ok(next.run(req).await);
    }

    let user = authenticate(req.headers(), path, &state.get_jwt_service())?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// 权限检查中间件 - 要求特定能力
///
/// ```ignore
/// Router::new()
///     .route("/api/users", get(handler::list))
///     .layer(middleware::from_fn(require_capability(Capability::ManageUsers)));
/// ```
///
/// Missing capability returns 403.
pub fn require_capability(
    capability: Capability,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or(AppError::unauthorized())?;

            if let Err(err) = capability.check(user.role) {
                security_log!(
                    "WARN",
                    "permission_denied",
                    user_id = user.id,
                    user_code = user.user_code.clone(),
                    role = user.role.as_str(),
                    required = capability.name()
                );
                return Err(err);
            }

            Ok(next.run(req).await)
        })
    }
}
