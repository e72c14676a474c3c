//! Notification Repository
//!
//! Every per-user query carries `user_id` in its WHERE clause so one user
//! can never read, mark or delete another user's rows.

use super::RepoResult;
use shared::models::{Notification, NotificationKind, NotificationSettings, Role};
use sqlx::{Executor, Sqlite, SqlitePool};

const NOTIFICATION_COLUMNS: &str = "id, user_id, title, message, kind, is_read, created_at";
const SETTINGS_COLUMNS: &str = "user_id, order_updates, wallet_updates, promotions, system_updates, email_notifications, push_notifications";

pub async fn insert<'c, E>(
    executor: E,
    user_id: i64,
    kind: NotificationKind,
    title: &str,
    message: &str,
) -> RepoResult<Notification>
where
    E: Executor<'c, Database = Sqlite>,
{
    let notification = sqlx::query_as::<_, Notification>(&format!(
        "INSERT INTO notifications (user_id, title, message, kind, is_read, created_at) \
         VALUES (?, ?, ?, ?, 0, ?) RETURNING {NOTIFICATION_COLUMNS}"
    ))
    .bind(user_id)
    .bind(title)
    .bind(message)
    .bind(kind)
    .bind(shared::util::now_millis())
    .fetch_one(executor)
    .await?;
    Ok(notification)
}

/// Newest first
pub async fn find_for_user(
    pool: &SqlitePool,
    user_id: i64,
    unread_only: bool,
    limit: i64,
    offset: i64,
) -> RepoResult<Vec<Notification>> {
    let rows = sqlx::query_as::<_, Notification>(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
         WHERE user_id = ?1 AND (?2 = 0 OR is_read = 0) \
         ORDER BY id DESC LIMIT ?3 OFFSET ?4"
    ))
    .bind(user_id)
    .bind(unread_only)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn count_for_user(pool: &SqlitePool, user_id: i64, unread_only: bool) -> RepoResult<i64> {
    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND (?2 = 0 OR is_read = 0)",
    )
    .bind(user_id)
    .bind(unread_only)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

/// `None` when the notification does not exist or belongs to someone else
pub async fn mark_read(pool: &SqlitePool, id: i64, user_id: i64) -> RepoResult<Option<Notification>> {
    let row = sqlx::query_as::<_, Notification>(&format!(
        "UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ? RETURNING {NOTIFICATION_COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Returns the number of rows that were unread
pub async fn mark_all_read(pool: &SqlitePool, user_id: i64) -> RepoResult<u64> {
    let rows = sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected())
}

pub async fn delete(pool: &SqlitePool, id: i64, user_id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() == 1)
}

pub async fn find_settings<'c, E>(executor: E, user_id: i64) -> RepoResult<Option<NotificationSettings>>
where
    E: Executor<'c, Database = Sqlite>,
{
    let settings = sqlx::query_as::<_, NotificationSettings>(&format!(
        "SELECT {SETTINGS_COLUMNS} FROM notification_settings WHERE user_id = ?"
    ))
    .bind(user_id)
    .fetch_optional(executor)
    .await?;
    Ok(settings)
}

pub async fn save_settings(pool: &SqlitePool, settings: &NotificationSettings) -> RepoResult<NotificationSettings> {
    let saved = sqlx::query_as::<_, NotificationSettings>(&format!(
        "INSERT INTO notification_settings ({SETTINGS_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
         ON CONFLICT(user_id) DO UPDATE SET \
           order_updates = ?2, wallet_updates = ?3, promotions = ?4, system_updates = ?5, \
           email_notifications = ?6, push_notifications = ?7 \
         RETURNING {SETTINGS_COLUMNS}"
    ))
    .bind(settings.user_id)
    .bind(settings.order_updates)
    .bind(settings.wallet_updates)
    .bind(settings.promotions)
    .bind(settings.system_updates)
    .bind(settings.email_notifications)
    .bind(settings.push_notifications)
    .fetch_one(pool)
    .await?;
    Ok(saved)
}

/// Broadcast targets
pub async fn active_user_ids(pool: &SqlitePool, role: Role) -> RepoResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE role = ? AND is_active = 1 ORDER BY id")
        .bind(role)
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

/// (total, unread) across all users
pub async fn count_totals(pool: &SqlitePool) -> RepoResult<(i64, i64)> {
    let totals = sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*), COALESCE(SUM(CASE WHEN is_read = 0 THEN 1 ELSE 0 END), 0) FROM notifications",
    )
    .fetch_one(pool)
    .await?;
    Ok(totals)
}

pub async fn count_by_kind(pool: &SqlitePool) -> RepoResult<Vec<(NotificationKind, i64)>> {
    let rows = sqlx::query_as::<_, (NotificationKind, i64)>(
        "SELECT kind, COUNT(*) FROM notifications GROUP BY kind",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_recent(pool: &SqlitePool, limit: i64) -> RepoResult<Vec<Notification>> {
    let rows = sqlx::query_as::<_, Notification>(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications ORDER BY id DESC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
