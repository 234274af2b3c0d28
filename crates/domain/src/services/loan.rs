//! Borrow and return bookkeeping.
//!
//! A borrow request is processed line by line inside one store transaction.
//! Each line either borrows or fails on its own; the transaction commits when
//! at least one line borrowed and rolls back otherwise. Every existing item
//! named by the request is locked up front in ascending id order, so
//! concurrent borrowers of the same item serialize, overlapping carts cannot
//! deadlock, and stock never drops below zero.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use super::stock::{raise_stock_alert, StockPolicy};
use super::store::{InventoryStore, InventoryTransaction, StoreError};
use crate::models::loan::{LoanItemRequest, LoanRequest};
use crate::models::{Actor, Item, Loan, NewLoan, StockError};

/// Whole-call failure of the loan service.
#[derive(Debug, Error)]
pub enum LoanError {
    #[error("Loan {0} not found")]
    LoanNotFound(i64),

    #[error("Loan {0} has already been returned")]
    AlreadyReturned(i64),

    #[error("Not allowed to return loan {0}")]
    Forbidden(i64),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a single line of a borrow request failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoanItemFailure {
    ItemNotFound { item_id: Option<i64> },
    InsufficientStock { available: i32, requested: i32 },
}

impl LoanItemFailure {
    pub fn code(&self) -> &'static str {
        match self {
            LoanItemFailure::ItemNotFound { .. } => "item_not_found",
            LoanItemFailure::InsufficientStock { .. } => "insufficient_stock",
        }
    }

    pub fn message(&self) -> String {
        match self {
            LoanItemFailure::ItemNotFound { item_id: Some(id) } => format!("Item {} not found", id),
            LoanItemFailure::ItemNotFound { item_id: None } => "Item not found".to_string(),
            LoanItemFailure::InsufficientStock {
                available,
                requested,
            } => format!(
                "Insufficient stock (available: {}, requested: {})",
                available, requested
            ),
        }
    }
}

/// Outcome of one line of a borrow request, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoanLine {
    Borrowed {
        loan: Loan,
        item_name: String,
        is_temporary: bool,
        remaining_stock: i32,
    },
    Failed {
        item_name: String,
        quantity: i32,
        failure: LoanItemFailure,
    },
}

impl LoanLine {
    pub fn is_borrowed(&self) -> bool {
        matches!(self, LoanLine::Borrowed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct CreateLoanOutcome {
    pub lines: Vec<LoanLine>,
    /// Messages of alerts raised by this call.
    pub notifications: Vec<String>,
    /// False when every line failed and nothing was persisted.
    pub committed: bool,
}

impl CreateLoanOutcome {
    pub fn borrowed_count(&self) -> usize {
        self.lines.iter().filter(|line| line.is_borrowed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.lines.len() - self.borrowed_count()
    }
}

#[derive(Debug, Clone)]
pub struct ReturnOutcome {
    pub loan: Loan,
    pub item_name: String,
    pub item_stock: i32,
    pub retired_alerts: u64,
}

#[derive(Debug, Clone)]
pub struct LoanService<S> {
    store: S,
    policy: StockPolicy,
}

impl<S: InventoryStore> LoanService<S> {
    pub fn new(store: S, policy: StockPolicy) -> Self {
        Self { store, policy }
    }

    /// Borrows every requested line that can be satisfied.
    pub async fn create_loan(
        &self,
        actor: &Actor,
        request: LoanRequest,
    ) -> Result<CreateLoanOutcome, LoanError> {
        if request.items.is_empty() {
            return Err(LoanError::Validation("No items selected".to_string()));
        }
        if let Some(bad) = request.items.iter().find(|entry| entry.quantity() < 1) {
            return Err(LoanError::Validation(format!(
                "Quantity must be at least 1, got {}",
                bad.quantity()
            )));
        }

        let now = Utc::now();
        let expected_return_date = request.expected_return_date;
        let mut tx = self.store.begin().await?;

        let mut lock_order: Vec<i64> = request
            .items
            .iter()
            .filter_map(LoanItemRequest::item_id)
            .collect();
        lock_order.sort_unstable();
        lock_order.dedup();
        for item_id in lock_order {
            tx.lock_item(item_id).await?;
        }

        let mut lines = Vec::with_capacity(request.items.len());
        let mut notifications = Vec::new();

        for entry in request.items {
            let line = self
                .borrow_line(
                    tx.as_mut(),
                    actor,
                    entry,
                    now,
                    expected_return_date,
                    &mut notifications,
                )
                .await?;
            lines.push(line);
        }

        let committed = lines.iter().any(LoanLine::is_borrowed);
        if committed {
            tx.commit().await?;
        } else {
            tx.rollback().await?;
        }

        let outcome = CreateLoanOutcome {
            lines,
            notifications,
            committed,
        };
        info!(
            user_id = actor.user_id,
            borrowed = outcome.borrowed_count(),
            failed = outcome.failed_count(),
            committed,
            "Loan request processed"
        );
        Ok(outcome)
    }

    async fn borrow_line(
        &self,
        tx: &mut dyn InventoryTransaction,
        actor: &Actor,
        entry: LoanItemRequest,
        now: DateTime<Utc>,
        expected_return_date: DateTime<Utc>,
        notifications: &mut Vec<String>,
    ) -> Result<LoanLine, LoanError> {
        let (mut item, quantity) = match entry {
            LoanItemRequest::Temporary { name, quantity } => {
                (tx.insert_temporary_item(&name, quantity).await?, quantity)
            }
            LoanItemRequest::Existing {
                item_id,
                name,
                quantity,
            } => match lookup_item(&mut *tx, item_id).await? {
                Some(item) => (item, quantity),
                None => {
                    warn!(?item_id, "Borrow line failed: item not found");
                    return Ok(LoanLine::Failed {
                        item_name: name,
                        quantity,
                        failure: LoanItemFailure::ItemNotFound { item_id },
                    });
                }
            },
        };

        if !item.is_temporary {
            match item.decrease_stock(quantity) {
                Ok(_) => {}
                Err(StockError::Insufficient {
                    available,
                    requested,
                }) => {
                    warn!(
                        item_id = item.id,
                        available, requested, "Borrow line failed: insufficient stock"
                    );
                    return Ok(LoanLine::Failed {
                        item_name: item.name,
                        quantity,
                        failure: LoanItemFailure::InsufficientStock {
                            available,
                            requested,
                        },
                    });
                }
                Err(e) => return Err(LoanError::Validation(e.to_string())),
            }
            tx.save_stock(item.id, item.stock).await?;
        }

        let loan = tx
            .insert_loan(NewLoan {
                user_id: actor.user_id,
                item_id: item.id,
                quantity,
                borrow_date: now,
                expected_return_date,
            })
            .await?;

        if !item.is_temporary {
            if let Some(alert) = raise_stock_alert(tx, &self.policy, &item).await? {
                notifications.push(alert.message);
            }
        }

        Ok(borrowed_line(loan, item))
    }

    /// Closes a loan and puts its quantity back in stock.
    pub async fn return_loan(&self, actor: &Actor, loan_id: i64) -> Result<ReturnOutcome, LoanError> {
        let mut tx = self.store.begin().await?;

        let loan = tx
            .lock_loan(loan_id)
            .await?
            .ok_or(LoanError::LoanNotFound(loan_id))?;
        if !actor.can_act_for(loan.user_id) {
            return Err(LoanError::Forbidden(loan_id));
        }
        if !loan.is_open() {
            return Err(LoanError::AlreadyReturned(loan_id));
        }

        let mut item = tx.lock_item(loan.item_id).await?.ok_or_else(|| {
            StoreError::Inconsistent(format!("loan {} references missing item", loan_id))
        })?;
        let loan = tx.mark_returned(loan_id, Utc::now()).await?;

        let mut retired_alerts = 0;
        if !item.is_temporary {
            item.increase_stock(loan.quantity)
                .map_err(|e| LoanError::Validation(e.to_string()))?;
            tx.save_stock(item.id, item.stock).await?;
            if self.policy.is_replenished(item.stock) {
                retired_alerts = tx.retire_stock_alerts(item.id).await?;
            }
        }

        tx.commit().await?;

        info!(
            loan_id,
            user_id = actor.user_id,
            item_id = item.id,
            stock = item.stock,
            retired_alerts,
            "Loan returned"
        );

        Ok(ReturnOutcome {
            loan,
            item_name: item.name,
            item_stock: item.stock,
            retired_alerts,
        })
    }
}

async fn lookup_item(
    tx: &mut dyn InventoryTransaction,
    item_id: Option<i64>,
) -> Result<Option<Item>, StoreError> {
    match item_id {
        Some(id) => tx.lock_item(id).await,
        None => Ok(None),
    }
}

fn borrowed_line(loan: Loan, item: Item) -> LoanLine {
    LoanLine::Borrowed {
        loan,
        remaining_stock: item.stock,
        is_temporary: item.is_temporary,
        item_name: item.name,
    }
}
