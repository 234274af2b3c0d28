//! Storage seam for the inventory services.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Item, Loan, NewLoan, NewNotification, Notification, NotificationKind};

/// Failure of the underlying store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Inconsistent store state: {0}")]
    Inconsistent(String),
}

/// Opens transactions over items, loans and notifications.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn InventoryTransaction>, StoreError>;
}

/// One open transaction.
///
/// Dropping it without [`commit`](InventoryTransaction::commit) discards
/// every write.
#[async_trait]
pub trait InventoryTransaction: Send {
    /// Reads an item and holds its row lock until the transaction ends.
    async fn lock_item(&mut self, item_id: i64) -> Result<Option<Item>, StoreError>;

    async fn insert_temporary_item(&mut self, name: &str, stock: i32) -> Result<Item, StoreError>;

    async fn save_stock(&mut self, item_id: i64, stock: i32) -> Result<(), StoreError>;

    async fn insert_loan(&mut self, loan: NewLoan) -> Result<Loan, StoreError>;

    /// Reads a loan and holds its row lock until the transaction ends.
    async fn lock_loan(&mut self, loan_id: i64) -> Result<Option<Loan>, StoreError>;

    async fn mark_returned(
        &mut self,
        loan_id: i64,
        returned_at: DateTime<Utc>,
    ) -> Result<Loan, StoreError>;

    async fn has_active_alert(
        &mut self,
        item_id: i64,
        kind: NotificationKind,
    ) -> Result<bool, StoreError>;

    async fn insert_notification(
        &mut self,
        notification: NewNotification,
    ) -> Result<Notification, StoreError>;

    /// Deactivates active danger and warning notifications of an item.
    async fn retire_stock_alerts(&mut self, item_id: i64) -> Result<u64, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
