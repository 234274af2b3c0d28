//! User repository.

use domain::models::Role;
use sqlx::PgPool;

use crate::entities::{UserEntity, UserSummaryEntity};
use crate::metrics::QueryTimer;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at";

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let result = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_name");
        let sql = format!("SELECT {} FROM users WHERE name = $1", USER_COLUMNS);
        let result = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Inserts a user. Name and email collisions surface as unique violations.
    pub async fn create(
        &self,
        name: &str,
        email: Option<&str>,
        password_hash: Option<&str>,
        role: Role,
    ) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user");
        let sql = format!(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let result = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(name)
            .bind(email)
            .bind(password_hash)
            .bind(role)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn list_with_open_loans(&self) -> Result<Vec<UserSummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_users");
        let result = sqlx::query_as::<_, UserSummaryEntity>(
            r#"
            SELECT u.id, u.name, u.email, u.password_hash, u.role, u.created_at,
                   COUNT(l.id) AS open_loans
            FROM users u
            LEFT JOIN loans l ON l.user_id = u.id AND l.return_date IS NULL
            GROUP BY u.id
            ORDER BY u.name
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn count_open_loans(&self, user_id: i64) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_user_open_loans");
        let result = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE user_id = $1 AND return_date IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes a user with no open loan. Returns rows removed.
    pub async fn delete_if_no_open_loans(&self, id: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_user");
        let result = sqlx::query(
            r#"
            DELETE FROM users u
            WHERE u.id = $1
              AND NOT EXISTS (
                  SELECT 1 FROM loans l WHERE l.user_id = u.id AND l.return_date IS NULL
              )
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    pub async fn update_role(&self, id: i64, role: Role) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_user_role");
        let sql = format!(
            "UPDATE users SET role = $2 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let result = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn count_super_admins(&self) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_super_admins");
        let result = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'super_admin'")
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }
}
