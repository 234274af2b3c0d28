//! In-memory store for service tests. Transactions work on a copy that
//! replaces the shared state on commit.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::store::{InventoryStore, InventoryTransaction, StoreError};
use crate::models::{Item, Loan, NewLoan, NewNotification, Notification, NotificationKind};

#[derive(Debug, Clone, Default)]
pub(crate) struct State {
    pub items: BTreeMap<i64, Item>,
    pub loans: BTreeMap<i64, Loan>,
    pub notifications: Vec<Notification>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryStore {
    state: Arc<Mutex<State>>,
    locks: Arc<Mutex<Vec<i64>>>,
    fail_loan_inserts: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every loan insert fails with a store error.
    pub fn failing_loan_inserts() -> Self {
        Self {
            fail_loan_inserts: true,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> State {
        self.state.lock().unwrap().clone()
    }

    pub fn add_item(&self, name: &str, stock: i32) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.items.insert(
            id,
            Item {
                id,
                name: name.to_string(),
                stock,
                is_temporary: false,
                zone_id: Some(1),
                furniture_id: Some(1),
                drawer_id: Some(1),
                created_at: Utc::now(),
            },
        );
        id
    }

    pub fn add_alert(&self, item_id: i64, kind: NotificationKind) {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.notifications.push(Notification {
            id,
            message: format!("{} alert", kind.as_str()),
            kind,
            item_id: Some(item_id),
            is_active: true,
            auto_dismiss: false,
            created_at: Utc::now(),
        });
    }

    /// Item ids in the order transactions locked them.
    pub fn lock_log(&self) -> Vec<i64> {
        self.locks.lock().unwrap().clone()
    }

    pub fn stock(&self, item_id: i64) -> i32 {
        self.snapshot().items[&item_id].stock
    }

    pub fn active_alerts(&self, item_id: i64) -> usize {
        self.snapshot()
            .notifications
            .iter()
            .filter(|n| n.item_id == Some(item_id) && n.is_active)
            .count()
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn InventoryTransaction>, StoreError> {
        Ok(Box::new(MemoryTransaction {
            shared: Arc::clone(&self.state),
            working: self.snapshot(),
            locks: Arc::clone(&self.locks),
            fail_loan_inserts: self.fail_loan_inserts,
        }))
    }
}

struct MemoryTransaction {
    shared: Arc<Mutex<State>>,
    working: State,
    locks: Arc<Mutex<Vec<i64>>>,
    fail_loan_inserts: bool,
}

#[async_trait]
impl InventoryTransaction for MemoryTransaction {
    async fn lock_item(&mut self, item_id: i64) -> Result<Option<Item>, StoreError> {
        self.locks.lock().unwrap().push(item_id);
        Ok(self.working.items.get(&item_id).cloned())
    }

    async fn insert_temporary_item(&mut self, name: &str, stock: i32) -> Result<Item, StoreError> {
        let id = self.working.next_id();
        let item = Item {
            id,
            name: name.to_string(),
            stock,
            is_temporary: true,
            zone_id: None,
            furniture_id: None,
            drawer_id: None,
            created_at: Utc::now(),
        };
        self.working.items.insert(id, item.clone());
        Ok(item)
    }

    async fn save_stock(&mut self, item_id: i64, stock: i32) -> Result<(), StoreError> {
        match self.working.items.get_mut(&item_id) {
            Some(item) => {
                item.stock = stock;
                Ok(())
            }
            None => Err(StoreError::Inconsistent(format!("item {} vanished", item_id))),
        }
    }

    async fn insert_loan(&mut self, loan: NewLoan) -> Result<Loan, StoreError> {
        if self.fail_loan_inserts {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let id = self.working.next_id();
        let loan = Loan {
            id,
            user_id: loan.user_id,
            item_id: loan.item_id,
            quantity: loan.quantity,
            borrow_date: loan.borrow_date,
            expected_return_date: loan.expected_return_date,
            return_date: None,
            returned: false,
        };
        self.working.loans.insert(id, loan.clone());
        Ok(loan)
    }

    async fn lock_loan(&mut self, loan_id: i64) -> Result<Option<Loan>, StoreError> {
        Ok(self.working.loans.get(&loan_id).cloned())
    }

    async fn mark_returned(
        &mut self,
        loan_id: i64,
        returned_at: DateTime<Utc>,
    ) -> Result<Loan, StoreError> {
        let loan = self
            .working
            .loans
            .get_mut(&loan_id)
            .ok_or_else(|| StoreError::Inconsistent(format!("loan {} vanished", loan_id)))?;
        loan.return_date = Some(returned_at);
        loan.returned = true;
        Ok(loan.clone())
    }

    async fn has_active_alert(
        &mut self,
        item_id: i64,
        kind: NotificationKind,
    ) -> Result<bool, StoreError> {
        Ok(self
            .working
            .notifications
            .iter()
            .any(|n| n.item_id == Some(item_id) && n.kind == kind && n.is_active))
    }

    async fn insert_notification(
        &mut self,
        notification: NewNotification,
    ) -> Result<Notification, StoreError> {
        let id = self.working.next_id();
        let notification = Notification {
            id,
            message: notification.message,
            kind: notification.kind,
            item_id: notification.item_id,
            is_active: true,
            auto_dismiss: notification.auto_dismiss,
            created_at: Utc::now(),
        };
        self.working.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn retire_stock_alerts(&mut self, item_id: i64) -> Result<u64, StoreError> {
        let mut retired = 0;
        for n in self.working.notifications.iter_mut() {
            if n.item_id == Some(item_id)
                && n.is_active
                && NotificationKind::STOCK_ALERTS.contains(&n.kind)
            {
                n.is_active = false;
                retired += 1;
            }
        }
        Ok(retired)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction {
            shared, working, ..
        } = *self;
        *shared.lock().unwrap() = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
