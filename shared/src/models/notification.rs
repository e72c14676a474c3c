//! Notification Models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum NotificationKind {
    Info,
    Order,
    Wallet,
    Promotion,
    System,
}

impl NotificationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Info => "INFO",
            NotificationKind::Order => "ORDER",
            NotificationKind::Wallet => "WALLET",
            NotificationKind::Promotion => "PROMOTION",
            NotificationKind::System => "SYSTEM",
        }
    }
}

/// In-app notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub created_at: i64,
}

/// Per-user delivery preferences
///
/// `email_notifications` / `push_notifications` are stored for clients;
/// only the in-app toggles gate delivery on the server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct NotificationSettings {
    pub user_id: i64,
    pub order_updates: bool,
    pub wallet_updates: bool,
    pub promotions: bool,
    pub system_updates: bool,
    pub email_notifications: bool,
    pub push_notifications: bool,
}

impl NotificationSettings {
    pub fn defaults_for(user_id: i64) -> Self {
        Self {
            user_id,
            order_updates: true,
            wallet_updates: true,
            promotions: true,
            system_updates: true,
            email_notifications: true,
            push_notifications: false,
        }
    }

    /// Whether an automatic notification of `kind` should be stored
    pub fn accepts(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::Info => true,
            NotificationKind::Order => self.order_updates,
            NotificationKind::Wallet => self.wallet_updates,
            NotificationKind::Promotion => self.promotions,
            NotificationKind::System => self.system_updates,
        }
    }

    pub fn apply(&mut self, patch: &NotificationSettingsUpdate) {
        let fields = [
            (&mut self.order_updates, patch.order_updates),
            (&mut self.wallet_updates, patch.wallet_updates),
            (&mut self.promotions, patch.promotions),
            (&mut self.system_updates, patch.system_updates),
            (&mut self.email_notifications, patch.email_notifications),
            (&mut self.push_notifications, patch.push_notifications),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
    }
}

/// Partial settings update; absent fields keep their value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationSettingsUpdate {
    pub order_updates: Option<bool>,
    pub wallet_updates: Option<bool>,
    pub promotions: Option<bool>,
    pub system_updates: Option<bool>,
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
}

/// Admin send payload: explicit `user_ids`, or `broadcast` to every active student
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSend {
    pub title: String,
    pub message: String,
    #[serde(default = "default_send_kind")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub user_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub broadcast: bool,
}

fn default_send_kind() -> NotificationKind {
    NotificationKind::Info
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSendResult {
    pub count: usize,
}

/// Admin overview of stored notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationStats {
    pub total: i64,
    pub unread: i64,
    /// Percentage of read notifications, 0 when there are none
    pub read_rate: f64,
    pub by_kind: BTreeMap<NotificationKind, i64>,
    pub recent: Vec<Notification>,
}
