//! User entities.

use chrono::{DateTime, Utc};
use domain::models::user::{UserResponse, UserSummary};
use domain::models::{Role, User};
use sqlx::FromRow;

/// Row of the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<UserEntity> for User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            email: entity.email,
            password_hash: entity.password_hash,
            role: entity.role,
            created_at: entity.created_at,
        }
    }
}

/// User with the number of loans still open.
#[derive(Debug, Clone, FromRow)]
pub struct UserSummaryEntity {
    #[sqlx(flatten)]
    pub user: UserEntity,
    pub open_loans: i64,
}

impl From<UserSummaryEntity> for UserSummary {
    fn from(entity: UserSummaryEntity) -> Self {
        Self {
            user: UserResponse::from(User::from(entity.user)),
            open_loans: entity.open_loans,
        }
    }
}
