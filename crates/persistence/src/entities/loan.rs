//! Loan entities.

use chrono::{DateTime, Utc};
use domain::models::item::location_info;
use domain::models::{Loan, LoanView};
use sqlx::FromRow;

/// Row of the loans table.
#[derive(Debug, Clone, FromRow)]
pub struct LoanEntity {
    pub id: i64,
    pub user_id: i64,
    pub item_id: i64,
    pub quantity: i32,
    pub borrow_date: DateTime<Utc>,
    pub expected_return_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub returned: bool,
}

impl From<LoanEntity> for Loan {
    fn from(entity: LoanEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            item_id: entity.item_id,
            quantity: entity.quantity,
            borrow_date: entity.borrow_date,
            expected_return_date: entity.expected_return_date,
            return_date: entity.return_date,
            returned: entity.returned,
        }
    }
}

/// Loan joined with borrower, item and location names.
#[derive(Debug, Clone, FromRow)]
pub struct LoanViewEntity {
    #[sqlx(flatten)]
    pub loan: LoanEntity,
    pub user_name: String,
    pub item_name: String,
    pub is_temporary: bool,
    pub zone_name: Option<String>,
    pub furniture_name: Option<String>,
    pub drawer_name: Option<String>,
}

impl LoanViewEntity {
    /// Builds the view with overdue fields computed against `now`.
    pub fn into_view(self, now: DateTime<Utc>) -> LoanView {
        let info = location_info(
            self.is_temporary,
            self.zone_name.as_deref(),
            self.furniture_name.as_deref(),
            self.drawer_name.as_deref(),
        );
        LoanView::new(
            self.loan.into(),
            self.user_name,
            self.item_name,
            self.is_temporary,
            info,
            now,
        )
    }
}
