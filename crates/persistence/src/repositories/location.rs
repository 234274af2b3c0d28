//! Location repository for the zone/furniture/drawer hierarchy.

use domain::models::Placement;
use sqlx::PgPool;

use crate::entities::{DrawerEntity, FurnitureEntity, ItemRefEntity, ZoneEntity};
use crate::metrics::QueryTimer;

/// Level of the hierarchy an item reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationLevel {
    Zone,
    Furniture,
    Drawer,
}

impl LocationLevel {
    fn item_column(&self) -> &'static str {
        match self {
            LocationLevel::Zone => "zone_id",
            LocationLevel::Furniture => "furniture_id",
            LocationLevel::Drawer => "drawer_id",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LocationLevel::Zone => "zone",
            LocationLevel::Furniture => "furniture",
            LocationLevel::Drawer => "drawer",
        }
    }
}

#[derive(Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_zones(&self) -> Result<Vec<ZoneEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_zones");
        let result = sqlx::query_as::<_, ZoneEntity>(
            "SELECT id, name, description, created_at FROM zones ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_zone(&self, id: i64) -> Result<Option<ZoneEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_zone");
        let result = sqlx::query_as::<_, ZoneEntity>(
            "SELECT id, name, description, created_at FROM zones WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create_zone(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<ZoneEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_zone");
        let result = sqlx::query_as::<_, ZoneEntity>(
            r#"
            INSERT INTO zones (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes a zone; its furniture and drawers go with it.
    pub async fn delete_zone(&self, id: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_zone");
        let result = sqlx::query("DELETE FROM zones WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    pub async fn list_furniture(
        &self,
        zone_id: Option<i64>,
    ) -> Result<Vec<FurnitureEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_furniture");
        let result = sqlx::query_as::<_, FurnitureEntity>(
            r#"
            SELECT id, name, description, zone_id, created_at
            FROM furniture
            WHERE ($1::BIGINT IS NULL OR zone_id = $1)
            ORDER BY name
            "#,
        )
        .bind(zone_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_furniture(&self, id: i64) -> Result<Option<FurnitureEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_furniture");
        let result = sqlx::query_as::<_, FurnitureEntity>(
            "SELECT id, name, description, zone_id, created_at FROM furniture WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create_furniture(
        &self,
        name: &str,
        description: Option<&str>,
        zone_id: i64,
    ) -> Result<FurnitureEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_furniture");
        let result = sqlx::query_as::<_, FurnitureEntity>(
            r#"
            INSERT INTO furniture (name, description, zone_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, zone_id, created_at
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(zone_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes furniture; its drawers go with it.
    pub async fn delete_furniture(&self, id: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_furniture");
        let result = sqlx::query("DELETE FROM furniture WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    pub async fn list_drawers(
        &self,
        furniture_id: Option<i64>,
    ) -> Result<Vec<DrawerEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_drawers");
        let result = sqlx::query_as::<_, DrawerEntity>(
            r#"
            SELECT id, name, description, furniture_id, created_at
            FROM drawers
            WHERE ($1::BIGINT IS NULL OR furniture_id = $1)
            ORDER BY name
            "#,
        )
        .bind(furniture_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_drawer(&self, id: i64) -> Result<Option<DrawerEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_drawer");
        let result = sqlx::query_as::<_, DrawerEntity>(
            "SELECT id, name, description, furniture_id, created_at FROM drawers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create_drawer(
        &self,
        name: &str,
        description: Option<&str>,
        furniture_id: i64,
    ) -> Result<DrawerEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_drawer");
        let result = sqlx::query_as::<_, DrawerEntity>(
            r#"
            INSERT INTO drawers (name, description, furniture_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, furniture_id, created_at
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(furniture_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete_drawer(&self, id: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_drawer");
        let result = sqlx::query("DELETE FROM drawers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    /// True when the drawer belongs to the furniture and the furniture to the zone.
    pub async fn placement_exists(&self, placement: Placement) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("placement_exists");
        let result = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM drawers d
                JOIN furniture f ON f.id = d.furniture_id
                WHERE d.id = $3 AND f.id = $2 AND f.zone_id = $1
            )
            "#,
        )
        .bind(placement.zone_id)
        .bind(placement.furniture_id)
        .bind(placement.drawer_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Items stored at a location: the first `limit` by name and the total.
    pub async fn items_at(
        &self,
        level: LocationLevel,
        id: i64,
        limit: i64,
    ) -> Result<(Vec<ItemRefEntity>, i64), sqlx::Error> {
        let timer = QueryTimer::new("items_at_location");
        let column = level.item_column();

        let list_sql = format!(
            "SELECT id, name FROM items WHERE {} = $1 ORDER BY name LIMIT $2",
            column
        );
        let items = sqlx::query_as::<_, ItemRefEntity>(&list_sql)
            .bind(id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM items WHERE {} = $1", column);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        timer.record();
        Ok((items, total))
    }
}
