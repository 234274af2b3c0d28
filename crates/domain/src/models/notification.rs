//! Advisory notifications derived from stock levels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Warning,
    Danger,
    Success,
}

impl NotificationKind {
    /// Kinds raised and retired by stock transitions.
    pub const STOCK_ALERTS: [NotificationKind; 2] =
        [NotificationKind::Danger, NotificationKind::Warning];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
            NotificationKind::Danger => "danger",
            NotificationKind::Success => "success",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub item_id: Option<i64>,
    pub is_active: bool,
    pub auto_dismiss: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub message: String,
    pub kind: NotificationKind,
    pub item_id: Option<i64>,
    pub auto_dismiss: bool,
}

fn default_active_only() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default = "default_active_only")]
    pub active_only: bool,
}

impl Default for ListNotificationsQuery {
    fn default() -> Self {
        Self { active_only: true }
    }
}
