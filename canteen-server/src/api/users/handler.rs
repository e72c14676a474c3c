//! User Management Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use shared::models::{Role, UserCreate, UserInfo, UserProfile, UserUpdate};
use shared::{AppError, ErrorCode};

use crate::auth::CurrentUser;
use crate::auth::password::hash_secret_blocking;
use crate::core::ServerState;
use crate::db::repository::{RepoError, user as user_repo};
use crate::users::{self, NewAccount};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, MAX_URL_LEN, validate_email, validate_name,
    validate_optional_text, validate_pin,
};
use crate::utils::{Pagination, PaginationParams};

#[derive(Debug, Deserialize)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct UserList {
    pub users: Vec<UserInfo>,
    pub pagination: Pagination,
}

/// User plus its rendered QR credential
#[derive(Debug, Serialize)]
pub struct UserWithQr {
    pub user: UserInfo,
    pub qr_code: String,
    pub email_sent: bool,
}

/// GET /api/users - 用户列表
pub async fn list(
    State(state): State<ServerState>,
    Query(filter): Query<UserFilter>,
    Query(page): Query<PaginationParams>,
) -> Result<Json<UserList>, AppError> {
    let search = filter.search.as_deref();
    let users = user_repo::find_all(
        state.pool(),
        search,
        filter.role,
        page.limit(),
        page.offset(),
    )
    .await?;
    let total = user_repo::count_all(state.pool(), search, filter.role).await?;

    Ok(Json(UserList {
        users: users.iter().map(UserInfo::from).collect(),
        pagination: page.describe(total),
    }))
}

/// POST /api/users - 创建用户并发送 QR 凭证
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserWithQr>), AppError> {
    validate_name(&payload.name, "name", MAX_NAME_LEN)?;
    validate_email(&payload.email)?;
    validate_optional_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.photo, "photo", MAX_URL_LEN)?;
    validate_pin(&payload.pin)?;

    let user = users::create_account(
        state.pool(),
        NewAccount {
            name: payload.name,
            email: payload.email,
            phone: payload.phone,
            photo: payload.photo,
            role: payload.role.unwrap_or(Role::User),
            pin: payload.pin,
            password: None,
        },
    )
    .await?;

    let qr_code = users::render_credential(state.qr_encoder.as_ref(), &user)?;
    let email_sent = users::mail_credential(state.mailer.as_ref(), &user, &qr_code).await;

    tracing::info!(
        operator = %current_user.user_code,
        user_code = %user.user_code,
        email_sent,
        "User provisioned"
    );

    Ok((
        StatusCode::CREATED,
        Json(UserWithQr {
            user: UserInfo::from(&user),
            qr_code,
            email_sent,
        }),
    ))
}

/// PUT /api/users/{id} - 更新用户
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<UserInfo>, AppError> {
    if let Some(name) = &payload.name {
        validate_name(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(email) = &payload.email {
        validate_email(email)?;
    }
    validate_optional_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.photo, "photo", MAX_URL_LEN)?;

    let pin_hash = match payload.pin {
        Some(pin) => {
            validate_pin(&pin)?;
            let hash = hash_secret_blocking(pin)
                .await
                .map_err(|e| AppError::internal(format!("Failed to hash PIN: {e}")))?;
            Some(hash)
        }
        None => None,
    };

    let patch = user_repo::UserPatch {
        name: payload.name.map(|n| n.trim().to_string()),
        email: payload.email.map(|e| e.trim().to_lowercase()),
        phone: payload.phone,
        photo: payload.photo,
        is_active: payload.is_active,
        pin_hash,
    };

    let user = match user_repo::update(state.pool(), id, patch).await {
        Ok(user) => user,
        Err(RepoError::NotFound(_)) => return Err(AppError::new(ErrorCode::UserNotFound)),
        Err(RepoError::Duplicate(msg)) if msg.contains("users.email") => {
            return Err(AppError::new(ErrorCode::UserEmailExists));
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Json(UserInfo::from(&user)))
}

/// POST /api/users/{user_code}/qr - 重新生成并发送 QR 凭证
pub async fn regenerate_qr(
    State(state): State<ServerState>,
    Path(user_code): Path<String>,
) -> Result<Json<UserWithQr>, AppError> {
    let user = user_repo::find_by_code(state.pool(), &user_code)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    let qr_code = users::render_credential(state.qr_encoder.as_ref(), &user)?;
    let email_sent = users::mail_credential(state.mailer.as_ref(), &user, &qr_code).await;

    Ok(Json(UserWithQr {
        user: UserInfo::from(&user),
        qr_code,
        email_sent,
    }))
}

/// GET /api/users/profile
pub async fn profile(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> Result<Json<UserProfile>, AppError> {
    let user = user_repo::find_by_id(state.pool(), current_user.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    let total_orders = user_repo::count_orders(state.pool(), user.id).await?;

    Ok(Json(UserProfile {
        user: UserInfo::from(&user),
        total_orders,
    }))
}
