//! Notification repository.

use sqlx::PgPool;

use crate::entities::NotificationEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, active_only: bool) -> Result<Vec<NotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_notifications");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            SELECT id, message, kind, item_id, is_active, auto_dismiss, created_at
            FROM notifications
            WHERE (NOT $1 OR is_active)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Retires one notification. `None` when the id is unknown.
    pub async fn dismiss(&self, id: i64) -> Result<Option<NotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("dismiss_notification");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            UPDATE notifications
            SET is_active = FALSE
            WHERE id = $1
            RETURNING id, message, kind, item_id, is_active, auto_dismiss, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
