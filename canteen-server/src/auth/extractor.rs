//! 从请求中解析当前用户
//!
//! [`authenticate`] is shared by `require_auth` and the [`CurrentUser`]
//! extractor, so both reject the same tokens the same way.

use axum::{extract::FromRequestParts, http::request::Parts};
use http::HeaderMap;
use shared::AppError;

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;

/// Resolve the bearer access token in `headers` to a [`CurrentUser`]
pub fn authenticate(
    headers: &HeaderMap,
    path: &str,
    jwt: &JwtService,
) -> Result<CurrentUser, AppError> {
    let Some(header) = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        security_log!("WARN", "auth_missing", path = path.to_string());
        return Err(AppError::unauthorized());
    };

    let token = JwtService::extract_from_header(header)
        .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

    let claims = jwt.validate_access_token(token).map_err(|e| {
        security_log!(
            "WARN",
            "auth_failed",
            error = e.to_string(),
            path = path.to_string()
        );
        match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        }
    })?;

    CurrentUser::try_from(claims)
        .map_err(|e| AppError::invalid_token(format!("Malformed JWT claims: {e}")))
}

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }
        let user = authenticate(&parts.headers, parts.uri.path(), &state.get_jwt_service())?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
