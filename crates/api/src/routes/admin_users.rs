//! Admin user management routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::user::{UpdateRoleRequest, UserResponse, UserSummary};
use domain::models::{Role, User};
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminAuth, SuperAdminAuth};

/// GET /api/v1/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    _auth: AdminAuth,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = state.users.list_with_open_loans().await?;
    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

/// DELETE /api/v1/admin/users/:id
///
/// Admins cannot delete themselves, and only a super admin may delete
/// another admin. Users with open loans are kept.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AdminAuth(auth): AdminAuth,
) -> Result<StatusCode, ApiError> {
    if id == auth.actor.user_id {
        return Err(ApiError::Forbidden(
            "You cannot delete your own account".to_string(),
        ));
    }

    let target: User = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))?
        .into();
    if target.role >= Role::Admin && auth.actor.role < Role::SuperAdmin {
        return Err(ApiError::Forbidden(
            "Only a super admin can delete admin accounts".to_string(),
        ));
    }

    if state.users.delete_if_no_open_loans(id).await? == 0 {
        let open_loans = state.users.count_open_loans(id).await?;
        return Err(ApiError::Conflict(format!(
            "User '{}' has {} open loan(s)",
            target.name, open_loans
        )));
    }

    info!(
        user_id = id,
        admin_id = auth.actor.user_id,
        "User deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/admin/users/:id/role
pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    SuperAdminAuth(auth): SuperAdminAuth,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if id == auth.actor.user_id {
        return Err(ApiError::Forbidden(
            "You cannot change your own role".to_string(),
        ));
    }

    let user: User = state
        .users
        .update_role(id, request.role)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))?
        .into();

    info!(
        user_id = id,
        role = user.role.as_str(),
        admin_id = auth.actor.user_id,
        "User role updated"
    );
    Ok(Json(user.into()))
}
