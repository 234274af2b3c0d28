//! Current user.

use axum::{extract::State, Json};
use domain::models::user::MeResponse;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// GET /api/v1/me
pub async fn get_me(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<MeResponse>, ApiError> {
    let open_loans = state.users.count_open_loans(auth.user.id).await?;
    Ok(Json(MeResponse {
        user: auth.user.into(),
        open_loans,
    }))
}
