//! In-app notifications
//!
//! Automatic notices (order ready, order cancelled, wallet credited) and
//! admin sends both go through [`Notifier`], which drops a notice when the
//! recipient switched that kind off. `INFO` notices are always stored.

use std::collections::BTreeMap;

use shared::models::{
    Notification, NotificationKind, NotificationSend, NotificationSettings,
    NotificationSettingsUpdate, NotificationStats, Order, OrderStatus, Role,
};
use shared::{AppError, ErrorCode, Money};
use sqlx::SqlitePool;

use crate::db::repository::{RepoError, notification as repo};
use crate::utils::validation::{MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_required_text};

/// Upper bound on explicit recipients in one send
pub const MAX_RECIPIENTS: usize = 500;
const RECENT_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct Notifier {
    pool: SqlitePool,
}

impl Notifier {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store one notice unless the user opted out of `kind`
    ///
    /// Returns `None` when the notice was dropped.
    pub async fn notify(
        &self,
        user_id: i64,
        kind: NotificationKind,
        title: &str,
        message: &str,
    ) -> Result<Option<Notification>, AppError> {
        let settings = self.settings(user_id).await?;
        if !settings.accepts(kind) {
            tracing::debug!(user_id, kind = kind.as_str(), "Notification muted by settings");
            return Ok(None);
        }
        let notification = repo::insert(&self.pool, user_id, kind, title, message).await?;
        Ok(Some(notification))
    }

    /// Admin send, targeted or broadcast to every active student
    ///
    /// All rows are written in one transaction; an unknown recipient fails
    /// the whole send. Returns the number of notices stored.
    pub async fn send(&self, payload: &NotificationSend) -> Result<usize, AppError> {
        validate_required_text(&payload.title, "title", MAX_SHORT_TEXT_LEN)?;
        validate_required_text(&payload.message, "message", MAX_NOTE_LEN)?;

        let targets = if payload.broadcast {
            repo::active_user_ids(&self.pool, Role::User).await?
        } else {
            let mut ids = payload
                .user_ids
                .clone()
                .filter(|ids| !ids.is_empty())
                .ok_or_else(|| AppError::validation("Either user_ids or broadcast is required"))?;
            ids.sort_unstable();
            ids.dedup();
            if ids.len() > MAX_RECIPIENTS {
                return Err(AppError::validation(format!(
                    "At most {MAX_RECIPIENTS} recipients per send"
                )));
            }
            ids
        };

        let title = payload.title.trim();
        let message = payload.message.trim();
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        let mut stored = 0;
        for user_id in targets {
            let settings = repo::find_settings(&mut *tx, user_id)
                .await?
                .unwrap_or_else(|| NotificationSettings::defaults_for(user_id));
            if !settings.accepts(payload.kind) {
                continue;
            }
            repo::insert(&mut *tx, user_id, payload.kind, title, message)
                .await
                .map_err(|e| match e {
                    RepoError::Validation(_) => {
                        AppError::new(ErrorCode::UserNotFound).with_detail("user_id", user_id)
                    }
                    e => e.into(),
                })?;
            stored += 1;
        }
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(
            kind = payload.kind.as_str(),
            broadcast = payload.broadcast,
            stored,
            "Notification sent"
        );
        Ok(stored)
    }

    /// Stored settings, or the defaults when the user never saved any
    pub async fn settings(&self, user_id: i64) -> Result<NotificationSettings, AppError> {
        Ok(repo::find_settings(&self.pool, user_id)
            .await?
            .unwrap_or_else(|| NotificationSettings::defaults_for(user_id)))
    }

    pub async fn update_settings(
        &self,
        user_id: i64,
        patch: &NotificationSettingsUpdate,
    ) -> Result<NotificationSettings, AppError> {
        let mut settings = self.settings(user_id).await?;
        settings.apply(patch);
        Ok(repo::save_settings(&self.pool, &settings).await?)
    }

    pub async fn mark_read(&self, user_id: i64, id: i64) -> Result<Notification, AppError> {
        repo::mark_read(&self.pool, id, user_id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn mark_all_read(&self, user_id: i64) -> Result<u64, AppError> {
        Ok(repo::mark_all_read(&self.pool, user_id).await?)
    }

    pub async fn delete(&self, user_id: i64, id: i64) -> Result<(), AppError> {
        if repo::delete(&self.pool, id, user_id).await? {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }

    pub async fn stats(&self) -> Result<NotificationStats, AppError> {
        let (total, unread) = repo::count_totals(&self.pool).await?;
        let by_kind: BTreeMap<NotificationKind, i64> =
            repo::count_by_kind(&self.pool).await?.into_iter().collect();
        let recent = repo::find_recent(&self.pool, RECENT_LIMIT).await?;
        Ok(NotificationStats {
            total,
            unread,
            read_rate: read_rate(total, unread),
            by_kind,
            recent,
        })
    }
}

fn not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::NotificationNotFound).with_detail("notification_id", id)
}

/// Percentage with two decimals
fn read_rate(total: i64, unread: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let rate = (total - unread) as f64 * 100.0 / total as f64;
    (rate * 100.0).round() / 100.0
}

/// Title and message sent to the owner when an order enters `status`
pub fn order_status_notice(order: &Order, status: OrderStatus) -> Option<(String, String)> {
    match status {
        OrderStatus::Ready => Some((
            "Order ready".to_string(),
            format!(
                "Order {} is ready for pickup. Token {}.",
                order.order_number, order.token_number
            ),
        )),
        OrderStatus::Cancelled => Some((
            "Order cancelled".to_string(),
            format!("Order {} was cancelled by the canteen.", order.order_number),
        )),
        _ => None,
    }
}

pub fn wallet_credit_notice(amount: Money, balance: Money) -> (String, String) {
    (
        "Wallet recharged".to_string(),
        format!("₹{amount} was added to your wallet. New balance ₹{balance}."),
    )
}
