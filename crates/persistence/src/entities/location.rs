//! Zone, furniture and drawer entities.

use chrono::{DateTime, Utc};
use domain::models::{Drawer, Furniture, Zone};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct ZoneEntity {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ZoneEntity> for Zone {
    fn from(entity: ZoneEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            created_at: entity.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct FurnitureEntity {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub zone_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<FurnitureEntity> for Furniture {
    fn from(entity: FurnitureEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            zone_id: entity.zone_id,
            created_at: entity.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DrawerEntity {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub furniture_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<DrawerEntity> for Drawer {
    fn from(entity: DrawerEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            furniture_id: entity.furniture_id,
            created_at: entity.created_at,
        }
    }
}
