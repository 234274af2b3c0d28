//! Registration and login.
//!
//! Accounts are identified by name. A password is optional: accounts
//! without one log in by name alone, accounts with one must supply it.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::user::{LoginRequest, LoginResponse, RegisterRequest, UserResponse};
use domain::models::{Role, User};
use shared::password::{check_password_policy, hash_password, verify_password};
use shared::validation::normalize_name;
use tracing::{info, warn};
use validator::Validate;

use crate::app::AppState;
use crate::error::{is_unique_violation, ApiError};

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    request.validate()?;
    let name = required_name(&request.name)?;
    let email = request
        .email
        .as_deref()
        .and_then(normalize_name)
        .map(|e| e.to_lowercase());

    if state.users.find_by_name(&name).await?.is_some() {
        return Err(ApiError::Conflict(format!("Name '{}' is already taken", name)));
    }

    let password_hash = hash_optional_password(request.password.as_deref())?;
    let user = create_user(&state, &name, email.as_deref(), password_hash.as_deref()).await?;

    info!(user_id = user.id, has_password = user.has_password(), "User registered");

    Ok((StatusCode::CREATED, Json(issue_token(&state, user, true)?)))
}

/// POST /api/v1/auth/login
///
/// Unknown names are registered on the fly when `auth.auto_register` is on.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;
    let name = required_name(&request.name)?;
    let password = request.password.as_deref().filter(|p| !p.is_empty());

    let (user, registered) = match state.users.find_by_name(&name).await? {
        Some(entity) => {
            let user = User::from(entity);
            if let Some(hash) = user.password_hash.as_deref() {
                let supplied = password
                    .ok_or_else(|| ApiError::Unauthorized("Password required".to_string()))?;
                if !verify_password(supplied, hash)? {
                    warn!(user_id = user.id, "Login rejected: wrong password");
                    return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
                }
            }
            (user, false)
        }
        None if state.config.auth.auto_register => {
            let password_hash = hash_optional_password(password)?;
            let user = create_user(&state, &name, None, password_hash.as_deref()).await?;
            info!(user_id = user.id, "User auto-registered on login");
            (user, true)
        }
        None => return Err(ApiError::Unauthorized("Invalid credentials".to_string())),
    };

    info!(user_id = user.id, role = %user.role, "User logged in");
    Ok(Json(issue_token(&state, user, registered)?))
}

fn required_name(raw: &str) -> Result<String, ApiError> {
    normalize_name(raw).ok_or_else(|| ApiError::Validation("name: Must not be blank".to_string()))
}

fn hash_optional_password(password: Option<&str>) -> Result<Option<String>, ApiError> {
    match password.filter(|p| !p.is_empty()) {
        Some(password) => {
            check_password_policy(password)?;
            Ok(Some(hash_password(password)?))
        }
        None => Ok(None),
    }
}

async fn create_user(
    state: &AppState,
    name: &str,
    email: Option<&str>,
    password_hash: Option<&str>,
) -> Result<User, ApiError> {
    state
        .users
        .create(name, email, password_hash, Role::User)
        .await
        .map(User::from)
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("Name or email already in use".to_string())
            } else {
                e.into()
            }
        })
}

fn issue_token(state: &AppState, user: User, registered: bool) -> Result<LoginResponse, ApiError> {
    let issued = state.jwt.generate_access_token(user.id)?;
    Ok(LoginResponse {
        access_token: issued.token,
        token_type: "Bearer",
        expires_in: issued.expires_in,
        user: UserResponse::from(user),
        registered,
    })
}
