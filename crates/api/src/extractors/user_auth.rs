//! Bearer token authentication.
//!
//! `UserAuth` validates the access token and loads the account, so a deleted
//! user or a demoted admin loses access on the next request. `AdminAuth` and
//! `SuperAdminAuth` additionally check the role.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::{Actor, Role, User};

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated caller.
#[derive(Debug, Clone)]
pub struct UserAuth {
    pub user: User,
    pub actor: Actor,
    /// JWT ID of the presented token.
    pub jti: String,
}

/// Caller with at least the admin role.
#[derive(Debug, Clone)]
pub struct AdminAuth(pub UserAuth);

/// Caller with the super-admin role.
#[derive(Debug, Clone)]
pub struct SuperAdminAuth(pub UserAuth);

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header format".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<UserAuth>() {
            return Ok(auth.clone());
        }

        let token = bearer_token(parts)?;
        let claims = state
            .jwt
            .validate_access_token(token)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;
        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

        let user: User = state
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?
            .into();

        tracing::debug!(user_id, role = %user.role, "Authenticated request");

        let auth = UserAuth {
            actor: user.actor(),
            user,
            jti: claims.jti,
        };
        parts.extensions.insert(auth.clone());
        Ok(auth)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = UserAuth::from_request_parts(parts, state).await?;
        require_role(&auth, Role::Admin)?;
        Ok(AdminAuth(auth))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SuperAdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = UserAuth::from_request_parts(parts, state).await?;
        require_role(&auth, Role::SuperAdmin)?;
        Ok(SuperAdminAuth(auth))
    }
}

fn require_role(auth: &UserAuth, minimum: Role) -> Result<(), ApiError> {
    if auth.actor.role >= minimum {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "Requires the {} role",
            minimum.as_str()
        )))
    }
}
