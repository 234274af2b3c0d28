//! Notification entity.

use chrono::{DateTime, Utc};
use domain::models::{Notification, NotificationKind};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct NotificationEntity {
    pub id: i64,
    pub message: String,
    pub kind: NotificationKind,
    pub item_id: Option<i64>,
    pub is_active: bool,
    pub auto_dismiss: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationEntity> for Notification {
    fn from(entity: NotificationEntity) -> Self {
        Self {
            id: entity.id,
            message: entity.message,
            kind: entity.kind,
            item_id: entity.item_id,
            is_active: entity.is_active,
            auto_dismiss: entity.auto_dismiss,
            created_at: entity.created_at,
        }
    }
}
