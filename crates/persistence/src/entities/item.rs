//! Item entities.

use chrono::{DateTime, Utc};
use domain::models::location::ItemRef;
use domain::models::{Item, ItemView};
use sqlx::FromRow;

/// Row of the items table.
#[derive(Debug, Clone, FromRow)]
pub struct ItemEntity {
    pub id: i64,
    pub name: String,
    pub stock: i32,
    pub is_temporary: bool,
    pub zone_id: Option<i64>,
    pub furniture_id: Option<i64>,
    pub drawer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<ItemEntity> for Item {
    fn from(entity: ItemEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            stock: entity.stock,
            is_temporary: entity.is_temporary,
            zone_id: entity.zone_id,
            furniture_id: entity.furniture_id,
            drawer_id: entity.drawer_id,
            created_at: entity.created_at,
        }
    }
}

/// Item joined with location names and open-loan aggregates.
#[derive(Debug, Clone, FromRow)]
pub struct ItemViewEntity {
    #[sqlx(flatten)]
    pub item: ItemEntity,
    pub zone_name: Option<String>,
    pub furniture_name: Option<String>,
    pub drawer_name: Option<String>,
    pub open_loans: i64,
    pub borrowed_quantity: i64,
}

impl From<ItemViewEntity> for ItemView {
    fn from(entity: ItemViewEntity) -> Self {
        ItemView::new(
            entity.item.into(),
            entity.zone_name,
            entity.furniture_name,
            entity.drawer_name,
            entity.open_loans,
            entity.borrowed_quantity,
        )
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ItemRefEntity {
    pub id: i64,
    pub name: String,
}

impl From<ItemRefEntity> for ItemRef {
    fn from(entity: ItemRefEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_conversion_builds_location_info() {
        let entity = ItemViewEntity {
            item: ItemEntity {
                id: 5,
                name: "Crimper".into(),
                stock: 2,
                is_temporary: false,
                zone_id: Some(1),
                furniture_id: Some(2),
                drawer_id: Some(3),
                created_at: Utc::now(),
            },
            zone_name: Some("Workshop".into()),
            furniture_name: Some("Rack".into()),
            drawer_name: Some("Bin 4".into()),
            open_loans: 0,
            borrowed_quantity: 0,
        };

        let view: ItemView = entity.into();
        assert_eq!(view.location_info, "Workshop > Rack > Bin 4");
        assert!(!view.is_borrowed);
        assert_eq!(view.item.id, 5);
    }
}
