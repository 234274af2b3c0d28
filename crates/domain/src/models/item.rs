//! Catalogue item models and stock mutators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Shown instead of a location path for temporary items.
pub const TEMPORARY_LOCATION_INFO: &str = "Temporary item (no location)";

const UNSPECIFIED: &str = "Unspecified";

/// Rejected stock mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    #[error("Insufficient stock (available: {available}, requested: {requested})")]
    Insufficient { available: i32, requested: i32 },

    #[error("Quantity must be positive, got {0}")]
    NonPositiveQuantity(i32),

    #[error("Stock would overflow")]
    Overflow,
}

/// A catalogue item.
///
/// `stock` is only ever changed through [`Item::decrease_stock`] and
/// [`Item::increase_stock`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub stock: i32,
    pub is_temporary: bool,
    pub zone_id: Option<i64>,
    pub furniture_id: Option<i64>,
    pub drawer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Removes `quantity` units, returning the new stock.
    pub fn decrease_stock(&mut self, quantity: i32) -> Result<i32, StockError> {
        if quantity <= 0 {
            return Err(StockError::NonPositiveQuantity(quantity));
        }
        if self.stock < quantity {
            return Err(StockError::Insufficient {
                available: self.stock,
                requested: quantity,
            });
        }
        self.stock -= quantity;
        Ok(self.stock)
    }

    /// Adds `quantity` units, returning the new stock.
    pub fn increase_stock(&mut self, quantity: i32) -> Result<i32, StockError> {
        if quantity <= 0 {
            return Err(StockError::NonPositiveQuantity(quantity));
        }
        self.stock = self
            .stock
            .checked_add(quantity)
            .ok_or(StockError::Overflow)?;
        Ok(self.stock)
    }

    /// Moves stock to an absolute value through the two mutators.
    pub fn set_stock(&mut self, target: i32) -> Result<i32, StockError> {
        if target < 0 {
            return Err(StockError::NonPositiveQuantity(target));
        }
        match target.cmp(&self.stock) {
            std::cmp::Ordering::Greater => self.increase_stock(target - self.stock),
            std::cmp::Ordering::Less => self.decrease_stock(self.stock - target),
            std::cmp::Ordering::Equal => Ok(self.stock),
        }
    }

    /// Storage triple of a permanent item.
    pub fn placement(&self) -> Option<Placement> {
        match (self.zone_id, self.furniture_id, self.drawer_id) {
            (Some(zone_id), Some(furniture_id), Some(drawer_id)) if !self.is_temporary => {
                Some(Placement {
                    zone_id,
                    furniture_id,
                    drawer_id,
                })
            }
            _ => None,
        }
    }
}

/// Zone/Furniture/Drawer triple a permanent item is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub zone_id: i64,
    pub furniture_id: i64,
    pub drawer_id: i64,
}

/// Formats "Zone > Furniture > Drawer" for display.
pub fn location_info(
    is_temporary: bool,
    zone: Option<&str>,
    furniture: Option<&str>,
    drawer: Option<&str>,
) -> String {
    if is_temporary {
        return TEMPORARY_LOCATION_INFO.to_string();
    }
    format!(
        "{} > {} > {}",
        zone.unwrap_or(UNSPECIFIED),
        furniture.unwrap_or(UNSPECIFIED),
        drawer.unwrap_or(UNSPECIFIED)
    )
}

/// Item joined with its location names and borrow status.
#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: Item,
    pub zone_name: Option<String>,
    pub furniture_name: Option<String>,
    pub drawer_name: Option<String>,
    pub location_info: String,
    pub open_loans: i64,
    pub borrowed_quantity: i64,
    pub is_borrowed: bool,
}

impl ItemView {
    pub fn new(
        item: Item,
        zone_name: Option<String>,
        furniture_name: Option<String>,
        drawer_name: Option<String>,
        open_loans: i64,
        borrowed_quantity: i64,
    ) -> Self {
        let location_info = location_info(
            item.is_temporary,
            zone_name.as_deref(),
            furniture_name.as_deref(),
            drawer_name.as_deref(),
        );
        Self {
            item,
            zone_name,
            furniture_name,
            drawer_name,
            location_info,
            open_loans,
            borrowed_quantity,
            is_borrowed: open_loans > 0,
        }
    }
}

fn default_stock() -> i32 {
    1
}

/// Request payload for creating an item.
///
/// Location ids are ignored for temporary items.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateItemRequest {
    #[validate(
        length(min = 1, max = 200, message = "Name must be 1-200 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub name: String,

    #[serde(default)]
    pub is_temporary: bool,

    #[serde(default = "default_stock")]
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,

    pub zone_id: Option<i64>,
    pub furniture_id: Option<i64>,
    pub drawer_id: Option<i64>,
}

impl CreateItemRequest {
    /// Storage triple for a permanent item, `None` when any part is missing.
    pub fn placement(&self) -> Option<Placement> {
        Some(Placement {
            zone_id: self.zone_id?,
            furniture_id: self.furniture_id?,
            drawer_id: self.drawer_id?,
        })
    }
}

/// Entry of a batch creation; entries missing a field are skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItemEntry {
    pub name: Option<String>,
    pub zone_id: Option<i64>,
    pub furniture_id: Option<i64>,
    pub drawer_id: Option<i64>,
    pub stock: Option<i32>,
}

/// Request payload for batch creation of permanent items.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BatchCreateItemsRequest {
    #[validate(length(min = 1, max = 100, message = "Batch must contain 1-100 items"))]
    pub items: Vec<BatchItemEntry>,
}

/// Response for batch creation.
#[derive(Debug, Clone, Serialize)]
pub struct BatchCreateItemsResponse {
    pub success: bool,
    pub message: String,
    pub added_count: usize,
    pub skipped_count: usize,
}

/// Request payload for renaming or relocating a permanent item.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[validate(
        length(min = 1, max = 200, message = "Name must be 1-200 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub name: String,
    pub zone_id: i64,
    pub furniture_id: i64,
    pub drawer_id: i64,
}

impl UpdateItemRequest {
    pub fn placement(&self) -> Placement {
        Placement {
            zone_id: self.zone_id,
            furniture_id: self.furniture_id,
            drawer_id: self.drawer_id,
        }
    }
}

/// Item list filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    All,
    Temporary,
    Permanent,
}

/// Query parameters for listing items.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListItemsQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub kind: ItemKind,
    #[serde(default)]
    pub available_only: bool,
}

/// Query parameters for autocomplete.
#[derive(Debug, Clone, Deserialize)]
pub struct AutocompleteQuery {
    #[serde(default)]
    pub term: String,
}

/// One autocomplete suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct ItemSuggestion {
    pub id: i64,
    pub name: String,
    pub stock: i32,
    pub location_info: String,
}

/// Request payload for setting stock.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetStockRequest {
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,
}

/// Request payload for adding stock.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdjustStockRequest {
    #[validate(range(min = 1, message = "Adjustment must be at least 1"))]
    pub adjustment: i32,
}

/// Out-of-stock and low-stock items.
#[derive(Debug, Clone, Serialize)]
pub struct StockReport {
    pub out_of_stock: Vec<ItemView>,
    pub low_stock: Vec<ItemView>,
    pub total_items: i64,
    pub exhausted_threshold: i32,
    pub low_stock_threshold: i32,
}

/// Number of items created since midnight UTC.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ItemCountResponse {
    pub count: i64,
}
