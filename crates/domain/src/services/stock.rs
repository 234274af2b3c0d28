//! Stock thresholds, alert bookkeeping and admin stock changes.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::store::{InventoryStore, InventoryTransaction, StoreError};
use crate::models::{Item, NewNotification, Notification, NotificationKind, StockError};

/// Stock levels at which alerts are raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPolicy {
    /// Stock at or below this is exhausted.
    pub exhausted_threshold: i32,
    /// Stock at or below this, but above exhausted, is low.
    pub low_stock_threshold: i32,
}

impl Default for StockPolicy {
    fn default() -> Self {
        Self {
            exhausted_threshold: 0,
            low_stock_threshold: 2,
        }
    }
}

/// Alert-worthy stock level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    Exhausted,
    Low,
}

impl StockLevel {
    pub fn kind(&self) -> NotificationKind {
        match self {
            StockLevel::Exhausted => NotificationKind::Danger,
            StockLevel::Low => NotificationKind::Warning,
        }
    }

    pub fn message(&self, item_name: &str, stock: i32) -> String {
        match self {
            StockLevel::Exhausted => format!("Stock exhausted for item '{}'", item_name),
            StockLevel::Low => format!("Low stock for item '{}' ({} left)", item_name, stock),
        }
    }
}

impl StockPolicy {
    pub fn new(exhausted_threshold: i32, low_stock_threshold: i32) -> Result<Self, String> {
        if exhausted_threshold < 0 {
            return Err("exhausted_threshold must not be negative".to_string());
        }
        if low_stock_threshold < exhausted_threshold {
            return Err("low_stock_threshold must be >= exhausted_threshold".to_string());
        }
        Ok(Self {
            exhausted_threshold,
            low_stock_threshold,
        })
    }

    pub fn classify(&self, stock: i32) -> Option<StockLevel> {
        if stock <= self.exhausted_threshold {
            Some(StockLevel::Exhausted)
        } else if stock <= self.low_stock_threshold {
            Some(StockLevel::Low)
        } else {
            None
        }
    }

    /// Stock above the exhausted threshold retires alerts.
    pub fn is_replenished(&self, stock: i32) -> bool {
        stock > self.exhausted_threshold
    }
}

/// Raises the alert matching the item's stock unless one of that kind is
/// already active.
pub(crate) async fn raise_stock_alert(
    tx: &mut dyn InventoryTransaction,
    policy: &StockPolicy,
    item: &Item,
) -> Result<Option<Notification>, StoreError> {
    let Some(level) = policy.classify(item.stock) else {
        return Ok(None);
    };
    let kind = level.kind();
    if tx.has_active_alert(item.id, kind).await? {
        debug!(item_id = item.id, kind = kind.as_str(), "Stock alert already active");
        return Ok(None);
    }

    let notification = tx
        .insert_notification(NewNotification {
            message: level.message(&item.name, item.stock),
            kind,
            item_id: Some(item.id),
            auto_dismiss: false,
        })
        .await?;

    info!(
        item_id = item.id,
        stock = item.stock,
        kind = kind.as_str(),
        "Stock alert raised"
    );
    Ok(Some(notification))
}

/// Result of an admin stock change.
#[derive(Debug, Clone, Serialize)]
pub struct StockChange {
    pub item_id: i64,
    pub item_name: String,
    pub old_stock: i32,
    pub new_stock: i32,
    pub retired_alerts: u64,
    pub notifications: Vec<String>,
}

#[derive(Debug, Error)]
pub enum StockChangeError {
    #[error("Item {0} not found")]
    ItemNotFound(i64),

    #[error(transparent)]
    Stock(#[from] StockError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Admin stock changes, applied through the item's stock mutators.
#[derive(Debug, Clone)]
pub struct StockService<S> {
    store: S,
    policy: StockPolicy,
}

impl<S: InventoryStore> StockService<S> {
    pub fn new(store: S, policy: StockPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &StockPolicy {
        &self.policy
    }

    /// Sets an absolute stock value.
    pub async fn set_stock(&self, item_id: i64, target: i32) -> Result<StockChange, StockChangeError> {
        self.apply(item_id, |item| item.set_stock(target)).await
    }

    /// Adds stock; the adjustment must be positive.
    pub async fn adjust_stock(
        &self,
        item_id: i64,
        adjustment: i32,
    ) -> Result<StockChange, StockChangeError> {
        self.apply(item_id, |item| item.increase_stock(adjustment)).await
    }

    async fn apply<F>(&self, item_id: i64, mutate: F) -> Result<StockChange, StockChangeError>
    where
        F: FnOnce(&mut Item) -> Result<i32, StockError> + Send,
    {
        let mut tx = self.store.begin().await?;

        let mut item = tx
            .lock_item(item_id)
            .await?
            .ok_or(StockChangeError::ItemNotFound(item_id))?;
        let old_stock = item.stock;
        let new_stock = mutate(&mut item)?;

        let mut retired_alerts = 0;
        let mut notifications = Vec::new();
        if new_stock != old_stock {
            tx.save_stock(item.id, new_stock).await?;
            if new_stock > old_stock && self.policy.is_replenished(new_stock) {
                retired_alerts = tx.retire_stock_alerts(item.id).await?;
            } else if new_stock < old_stock && !item.is_temporary {
                if let Some(raised) = raise_stock_alert(tx.as_mut(), &self.policy, &item).await? {
                    notifications.push(raised.message);
                }
            }
        }

        tx.commit().await?;

        info!(
            item_id,
            old_stock,
            new_stock,
            retired_alerts,
            "Stock updated"
        );

        Ok(StockChange {
            item_id,
            item_name: item.name,
            old_stock,
            new_stock,
            retired_alerts,
            notifications,
        })
    }
}
