//! PostgreSQL implementation of the inventory store.
//!
//! Items and loans are read with `SELECT ... FOR UPDATE`, so the row stays
//! locked until the surrounding transaction commits or rolls back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{Item, Loan, NewLoan, NewNotification, Notification, NotificationKind};
use domain::services::{InventoryStore, InventoryTransaction, StoreError};
use sqlx::{PgPool, Postgres, Transaction};

use crate::entities::{ItemEntity, LoanEntity, NotificationEntity};
use crate::metrics::QueryTimer;

const ITEM_COLUMNS: &str =
    "id, name, stock, is_temporary, zone_id, furniture_id, drawer_id, created_at";
const LOAN_COLUMNS: &str =
    "id, user_id, item_id, quantity, borrow_date, expected_return_date, return_date, returned";

/// Opens PostgreSQL transactions for the loan and stock services.
#[derive(Clone)]
pub struct PgInventoryStore {
    pool: PgPool,
}

impl PgInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    async fn begin(&self) -> Result<Box<dyn InventoryTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgInventoryTransaction { tx }))
    }
}

/// Wraps a sqlx transaction; dropping it uncommitted rolls back.
pub struct PgInventoryTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl InventoryTransaction for PgInventoryTransaction {
    async fn lock_item(&mut self, item_id: i64) -> Result<Option<Item>, StoreError> {
        let timer = QueryTimer::new("lock_item");
        let sql = format!("SELECT {} FROM items WHERE id = $1 FOR UPDATE", ITEM_COLUMNS);
        let result = sqlx::query_as::<_, ItemEntity>(&sql)
            .bind(item_id)
            .fetch_optional(&mut *self.tx)
            .await;
        timer.record();
        Ok(result?.map(Item::from))
    }

    async fn insert_temporary_item(&mut self, name: &str, stock: i32) -> Result<Item, StoreError> {
        let timer = QueryTimer::new("insert_temporary_item");
        let sql = format!(
            "INSERT INTO items (name, stock, is_temporary) VALUES ($1, $2, TRUE) RETURNING {}",
            ITEM_COLUMNS
        );
        let result = sqlx::query_as::<_, ItemEntity>(&sql)
            .bind(name)
            .bind(stock)
            .fetch_one(&mut *self.tx)
            .await;
        timer.record();
        Ok(result?.into())
    }

    async fn save_stock(&mut self, item_id: i64, stock: i32) -> Result<(), StoreError> {
        let timer = QueryTimer::new("save_item_stock");
        let result = sqlx::query("UPDATE items SET stock = $2 WHERE id = $1")
            .bind(item_id)
            .bind(stock)
            .execute(&mut *self.tx)
            .await;
        timer.record();
        if result?.rows_affected() == 0 {
            return Err(StoreError::Inconsistent(format!(
                "item {} disappeared while locked",
                item_id
            )));
        }
        Ok(())
    }

    async fn insert_loan(&mut self, loan: NewLoan) -> Result<Loan, StoreError> {
        let timer = QueryTimer::new("insert_loan");
        let sql = format!(
            r#"
            INSERT INTO loans (user_id, item_id, quantity, borrow_date, expected_return_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            LOAN_COLUMNS
        );
        let result = sqlx::query_as::<_, LoanEntity>(&sql)
            .bind(loan.user_id)
            .bind(loan.item_id)
            .bind(loan.quantity)
            .bind(loan.borrow_date)
            .bind(loan.expected_return_date)
            .fetch_one(&mut *self.tx)
            .await;
        timer.record();
        Ok(result?.into())
    }

    async fn lock_loan(&mut self, loan_id: i64) -> Result<Option<Loan>, StoreError> {
        let timer = QueryTimer::new("lock_loan");
        let sql = format!("SELECT {} FROM loans WHERE id = $1 FOR UPDATE", LOAN_COLUMNS);
        let result = sqlx::query_as::<_, LoanEntity>(&sql)
            .bind(loan_id)
            .fetch_optional(&mut *self.tx)
            .await;
        timer.record();
        Ok(result?.map(Loan::from))
    }

    async fn mark_returned(
        &mut self,
        loan_id: i64,
        returned_at: DateTime<Utc>,
    ) -> Result<Loan, StoreError> {
        let timer = QueryTimer::new("mark_loan_returned");
        let sql = format!(
            r#"
            UPDATE loans
            SET returned = TRUE, return_date = $2
            WHERE id = $1
            RETURNING {}
            "#,
            LOAN_COLUMNS
        );
        let result = sqlx::query_as::<_, LoanEntity>(&sql)
            .bind(loan_id)
            .bind(returned_at)
            .fetch_one(&mut *self.tx)
            .await;
        timer.record();
        Ok(result?.into())
    }

    async fn has_active_alert(
        &mut self,
        item_id: i64,
        kind: NotificationKind,
    ) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("has_active_alert");
        let result: Result<bool, sqlx::Error> = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM notifications
                WHERE item_id = $1 AND kind = $2 AND is_active
            )
            "#,
        )
        .bind(item_id)
        .bind(kind)
        .fetch_one(&mut *self.tx)
        .await;
        timer.record();
        Ok(result?)
    }

    async fn insert_notification(
        &mut self,
        notification: NewNotification,
    ) -> Result<Notification, StoreError> {
        let timer = QueryTimer::new("insert_notification");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            INSERT INTO notifications (message, kind, item_id, auto_dismiss)
            VALUES ($1, $2, $3, $4)
            RETURNING id, message, kind, item_id, is_active, auto_dismiss, created_at
            "#,
        )
        .bind(&notification.message)
        .bind(notification.kind)
        .bind(notification.item_id)
        .bind(notification.auto_dismiss)
        .fetch_one(&mut *self.tx)
        .await;
        timer.record();
        Ok(result?.into())
    }

    async fn retire_stock_alerts(&mut self, item_id: i64) -> Result<u64, StoreError> {
        let timer = QueryTimer::new("retire_stock_alerts");
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_active = FALSE
            WHERE item_id = $1 AND is_active AND kind IN ('danger', 'warning')
            "#,
        )
        .bind(item_id)
        .execute(&mut *self.tx)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
