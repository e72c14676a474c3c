//! Notification Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::AppError;
use shared::models::{
    Notification, NotificationSend, NotificationSendResult, NotificationSettings,
    NotificationSettingsUpdate, NotificationStats,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::notification as repo;
use crate::utils::{Pagination, PaginationParams};

#[derive(Debug, Deserialize)]
pub struct NotificationFilter {
    #[serde(default, rename = "unreadOnly", alias = "unread_only")]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct MarkAllResult {
    pub updated: u64,
}

/// GET /api/notifications - 当前用户的通知 (newest first)
pub async fn list(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Query(filter): Query<NotificationFilter>,
    Query(page): Query<PaginationParams>,
) -> Result<Json<NotificationList>, AppError> {
    let pool = state.pool();
    let notifications = repo::find_for_user(
        pool,
        current_user.id,
        filter.unread_only,
        page.limit(),
        page.offset(),
    )
    .await?;
    let total = repo::count_for_user(pool, current_user.id, filter.unread_only).await?;
    Ok(Json(NotificationList {
        notifications,
        pagination: page.describe(total),
    }))
}

/// PUT /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Notification>, AppError> {
    let notification = state.notifier.mark_read(current_user.id, id).await?;
    Ok(Json(notification))
}

/// PUT /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> Result<Json<MarkAllResult>, AppError> {
    let updated = state.notifier.mark_all_read(current_user.id).await?;
    Ok(Json(MarkAllResult { updated }))
}

/// DELETE /api/notifications/{id}
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<bool>, AppError> {
    state.notifier.delete(current_user.id, id).await?;
    Ok(Json(true))
}

/// GET /api/notifications/settings
pub async fn get_settings(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> Result<Json<NotificationSettings>, AppError> {
    Ok(Json(state.notifier.settings(current_user.id).await?))
}

/// PUT /api/notifications/settings
pub async fn update_settings(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(patch): Json<NotificationSettingsUpdate>,
) -> Result<Json<NotificationSettings>, AppError> {
    let settings = state
        .notifier
        .update_settings(current_user.id, &patch)
        .await?;
    Ok(Json(settings))
}

/// POST /api/notifications/send - 管理员发送通知
pub async fn send(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<NotificationSend>,
) -> Result<Json<NotificationSendResult>, AppError> {
    let count = state.notifier.send(&payload).await?;
    tracing::info!(operator = %current_user.user_code, count, "Admin notification delivered");
    Ok(Json(NotificationSendResult { count }))
}

/// GET /api/notifications/stats
pub async fn stats(State(state): State<ServerState>) -> Result<Json<NotificationStats>, AppError> {
    Ok(Json(state.notifier.stats().await?))
}
