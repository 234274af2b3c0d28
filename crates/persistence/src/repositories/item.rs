//! Item repository for catalogue queries.

use chrono::{DateTime, Utc};
use domain::models::item::{ItemKind, ListItemsQuery};
use domain::models::Placement;
use sqlx::PgPool;

use crate::entities::{ItemEntity, ItemViewEntity};
use crate::metrics::QueryTimer;

/// Joined select shared by every item view query.
const ITEM_VIEW_SELECT: &str = r#"
    SELECT i.id, i.name, i.stock, i.is_temporary, i.zone_id, i.furniture_id, i.drawer_id,
           i.created_at,
           z.name AS zone_name, f.name AS furniture_name, d.name AS drawer_name,
           COALESCE(ol.open_loans, 0) AS open_loans,
           COALESCE(ol.borrowed_quantity, 0) AS borrowed_quantity
    FROM items i
    LEFT JOIN zones z ON z.id = i.zone_id
    LEFT JOIN furniture f ON f.id = i.furniture_id
    LEFT JOIN drawers d ON d.id = i.drawer_id
    LEFT JOIN (
        SELECT item_id, COUNT(*) AS open_loans, SUM(quantity)::BIGINT AS borrowed_quantity
        FROM loans
        WHERE return_date IS NULL
        GROUP BY item_id
    ) ol ON ol.item_id = i.id
"#;

const ITEM_COLUMNS: &str =
    "id, name, stock, is_temporary, zone_id, furniture_id, drawer_id, created_at";

/// Most suggestions returned by autocomplete.
pub const AUTOCOMPLETE_LIMIT: i64 = 10;

/// Out-of-stock and low-stock rows plus the catalogue size.
#[derive(Debug, Clone)]
pub struct StockReportRows {
    pub out_of_stock: Vec<ItemViewEntity>,
    pub low_stock: Vec<ItemViewEntity>,
    pub total_items: i64,
}

#[derive(Clone)]
pub struct ItemRepository {
    pool: PgPool,
}

impl ItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists items ordered by name.
    pub async fn list(&self, query: &ListItemsQuery) -> Result<Vec<ItemViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_items");
        let temporary = match query.kind {
            ItemKind::All => None,
            ItemKind::Temporary => Some(true),
            ItemKind::Permanent => Some(false),
        };
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let sql = format!(
            r#"{}
            WHERE ($1::TEXT IS NULL OR i.name ILIKE '%' || $1 || '%')
              AND ($2::BOOLEAN IS NULL OR i.is_temporary = $2)
              AND (NOT $3 OR i.stock > 0)
            ORDER BY i.name, i.id
            "#,
            ITEM_VIEW_SELECT
        );
        let result = sqlx::query_as::<_, ItemViewEntity>(&sql)
            .bind(search)
            .bind(temporary)
            .bind(query.available_only)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Name suggestions, prefix matches first.
    pub async fn autocomplete(&self, term: &str) -> Result<Vec<ItemViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("autocomplete_items");
        let sql = format!(
            r#"{}
            WHERE i.name ILIKE '%' || $1 || '%'
            ORDER BY (i.name ILIKE $1 || '%') DESC, i.name
            LIMIT $2
            "#,
            ITEM_VIEW_SELECT
        );
        let result = sqlx::query_as::<_, ItemViewEntity>(&sql)
            .bind(term)
            .bind(AUTOCOMPLETE_LIMIT)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn find_view(&self, id: i64) -> Result<Option<ItemViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_item_view");
        let sql = format!("{} WHERE i.id = $1", ITEM_VIEW_SELECT);
        let result = sqlx::query_as::<_, ItemViewEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<ItemEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_item_by_id");
        let sql = format!("SELECT {} FROM items WHERE id = $1", ITEM_COLUMNS);
        let result = sqlx::query_as::<_, ItemEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Inserts a permanent item. A duplicate name at the same placement
    /// violates `idx_items_permanent_unique`.
    pub async fn create_permanent(
        &self,
        name: &str,
        stock: i32,
        placement: Placement,
    ) -> Result<ItemEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_permanent_item");
        let sql = format!(
            r#"
            INSERT INTO items (name, stock, is_temporary, zone_id, furniture_id, drawer_id)
            VALUES ($1, $2, FALSE, $3, $4, $5)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        );
        let result = sqlx::query_as::<_, ItemEntity>(&sql)
            .bind(name)
            .bind(stock)
            .bind(placement.zone_id)
            .bind(placement.furniture_id)
            .bind(placement.drawer_id)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn create_temporary(&self, name: &str, stock: i32) -> Result<ItemEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_temporary_item");
        let sql = format!(
            "INSERT INTO items (name, stock, is_temporary) VALUES ($1, $2, TRUE) RETURNING {}",
            ITEM_COLUMNS
        );
        let result = sqlx::query_as::<_, ItemEntity>(&sql)
            .bind(name)
            .bind(stock)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Renames and relocates a permanent item. Returns `None` for unknown or
    /// temporary items.
    pub async fn update_permanent(
        &self,
        id: i64,
        name: &str,
        placement: Placement,
    ) -> Result<Option<ItemEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_item");
        let sql = format!(
            r#"
            UPDATE items
            SET name = $2, zone_id = $3, furniture_id = $4, drawer_id = $5
            WHERE id = $1 AND NOT is_temporary
            RETURNING {}
            "#,
            ITEM_COLUMNS
        );
        let result = sqlx::query_as::<_, ItemEntity>(&sql)
            .bind(id)
            .bind(name)
            .bind(placement.zone_id)
            .bind(placement.furniture_id)
            .bind(placement.drawer_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Items created at or after `since`, temporary ones included.
    pub async fn count_created_since(&self, since: DateTime<Utc>) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_items_created_since");
        let result = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE created_at >= $1")
            .bind(since)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn count_open_loans(&self, item_id: i64) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_item_open_loans");
        let result = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE item_id = $1 AND return_date IS NULL",
        )
        .bind(item_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes an item that has no open loan. Returns rows removed.
    pub async fn delete_if_unborrowed(&self, id: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_item");
        let result = sqlx::query(
            r#"
            DELETE FROM items i
            WHERE i.id = $1
              AND NOT EXISTS (
                  SELECT 1 FROM loans l WHERE l.item_id = i.id AND l.return_date IS NULL
              )
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    /// Deletes temporary items without an open loan.
    pub async fn purge_unborrowed_temporary(&self) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("purge_temporary_items");
        let result = sqlx::query(
            r#"
            DELETE FROM items i
            WHERE i.is_temporary
              AND NOT EXISTS (
                  SELECT 1 FROM loans l WHERE l.item_id = i.id AND l.return_date IS NULL
              )
            "#,
        )
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    /// Items at or below the thresholds.
    pub async fn stock_report(
        &self,
        exhausted_threshold: i32,
        low_stock_threshold: i32,
    ) -> Result<StockReportRows, sqlx::Error> {
        let timer = QueryTimer::new("stock_report");

        let out_sql = format!("{} WHERE i.stock <= $1 ORDER BY i.name", ITEM_VIEW_SELECT);
        let out_of_stock = sqlx::query_as::<_, ItemViewEntity>(&out_sql)
            .bind(exhausted_threshold)
            .fetch_all(&self.pool)
            .await?;

        let low_sql = format!(
            "{} WHERE i.stock > $1 AND i.stock <= $2 ORDER BY i.stock, i.name",
            ITEM_VIEW_SELECT
        );
        let low_stock = sqlx::query_as::<_, ItemViewEntity>(&low_sql)
            .bind(exhausted_threshold)
            .bind(low_stock_threshold)
            .fetch_all(&self.pool)
            .await?;

        let total_items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;

        timer.record();
        Ok(StockReportRows {
            out_of_stock,
            low_stock,
            total_items,
        })
    }
}
