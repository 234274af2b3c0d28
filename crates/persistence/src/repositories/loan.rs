//! Loan repository for read-side listings. Writes go through
//! [`crate::PgInventoryStore`].

use sqlx::PgPool;

use crate::entities::LoanViewEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct LoanRepository {
    pool: PgPool,
}

impl LoanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loans newest first, optionally limited to one borrower or to open loans.
    pub async fn list(
        &self,
        user_id: Option<i64>,
        active_only: bool,
    ) -> Result<Vec<LoanViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_loans");
        let result = sqlx::query_as::<_, LoanViewEntity>(
            r#"
            SELECT l.id, l.user_id, l.item_id, l.quantity, l.borrow_date,
                   l.expected_return_date, l.return_date, l.returned,
                   u.name AS user_name, i.name AS item_name, i.is_temporary,
                   z.name AS zone_name, f.name AS furniture_name, d.name AS drawer_name
            FROM loans l
            JOIN users u ON u.id = l.user_id
            JOIN items i ON i.id = l.item_id
            LEFT JOIN zones z ON z.id = i.zone_id
            LEFT JOIN furniture f ON f.id = i.furniture_id
            LEFT JOIN drawers d ON d.id = i.drawer_id
            WHERE ($1::BIGINT IS NULL OR l.user_id = $1)
              AND (NOT $2 OR l.return_date IS NULL)
            ORDER BY l.borrow_date DESC, l.id DESC
            "#,
        )
        .bind(user_id)
        .bind(active_only)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
