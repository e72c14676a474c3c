//! Authentication Handlers

use axum::{Json, extract::State};
use serde::Deserialize;
use shared::AppError;
use shared::models::UserInfo;

use crate::auth::{Authenticated, CurrentUser, IdentityResolved, LoginError};
use crate::core::ServerState;
use crate::db::repository::user as user_repo;
use crate::security_log;
use crate::utils::validation::{MAX_PASSWORD_LEN, MAX_SHORT_TEXT_LEN, validate_required_text};

#[derive(Debug, Deserialize)]
pub struct QrScanRequest {
    pub qr_data: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPinRequest {
    pub ticket: String,
    pub pin: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user_code: String,
    pub password: String,
}

fn log_failure(event: &'static str, subject: &str, err: &LoginError) {
    if !matches!(err, LoginError::Repo(_) | LoginError::Jwt(_)) {
        security_log!(
            "WARN",
            event,
            subject = subject.to_string(),
            reason = err.to_string()
        );
    }
}

/// POST /api/auth/qr/scan - QR 登录第一步
pub async fn scan_qr(
    State(state): State<ServerState>,
    Json(req): Json<QrScanRequest>,
) -> Result<Json<IdentityResolved>, AppError> {
    validate_required_text(&req.qr_data, "qr_data", MAX_SHORT_TEXT_LEN)?;

    match state.qr_login.scan(&req.qr_data).await {
        Ok(identity) => Ok(Json(identity)),
        Err(e) => {
            log_failure("qr_scan_failed", "qr", &e);
            Err(e.into())
        }
    }
}

/// POST /api/auth/qr/verify-pin - QR 登录第二步
pub async fn verify_pin(
    State(state): State<ServerState>,
    Json(req): Json<VerifyPinRequest>,
) -> Result<Json<Authenticated>, AppError> {
    match state.qr_login.verify_pin(&req.ticket, &req.pin).await {
        Ok(auth) => Ok(Json(auth)),
        Err(e) => {
            log_failure("pin_verify_failed", "ticket", &e);
            Err(e.into())
        }
    }
}

/// POST /api/auth/login - password login
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Authenticated>, AppError> {
    validate_required_text(&req.user_code, "user_code", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&req.password, "password", MAX_PASSWORD_LEN)?;

    match state
        .qr_login
        .password_login(&req.user_code, &req.password)
        .await
    {
        Ok(auth) => Ok(Json(auth)),
        Err(e) => {
            log_failure("login_failed", &req.user_code, &e);
            Err(e.into())
        }
    }
}

/// POST /api/auth/refresh - new access token for the current user
pub async fn refresh(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> Result<Json<Authenticated>, AppError> {
    let auth = state.qr_login.refresh(current_user.id).await?;
    Ok(Json(auth))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> Result<Json<UserInfo>, AppError> {
    let user = user_repo::find_by_id(state.pool(), current_user.id)
        .await?
        .ok_or_else(|| AppError::new(shared::ErrorCode::UserNotFound))?;
    Ok(Json(UserInfo::from(&user)))
}
