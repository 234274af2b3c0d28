//! Notification log routes.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::notification::ListNotificationsQuery;
use domain::models::Notification;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminAuth, UserAuth};

/// GET /api/v1/notifications?active_only=
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<ListNotificationsQuery>,
    _auth: UserAuth,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let rows = state.notifications.list(query.active_only).await?;
    Ok(Json(rows.into_iter().map(Notification::from).collect()))
}

/// POST /api/v1/notifications/:id/dismiss
pub async fn dismiss_notification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AdminAuth(auth): AdminAuth,
) -> Result<Json<Notification>, ApiError> {
    let notification = state
        .notifications
        .dismiss(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Notification {} not found", id)))?;

    info!(
        notification_id = id,
        admin_id = auth.actor.user_id,
        "Notification dismissed"
    );
    Ok(Json(notification.into()))
}
