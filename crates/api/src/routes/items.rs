//! Item catalogue routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveTime, Utc};
use domain::models::item::{
    AutocompleteQuery, BatchCreateItemsRequest, BatchCreateItemsResponse, BatchItemEntry,
    CreateItemRequest, ItemCountResponse, ItemSuggestion, ListItemsQuery, UpdateItemRequest,
};
use domain::models::{ItemView, Placement};
use serde::Serialize;
use shared::validation::normalize_name;
use tracing::{info, warn};
use validator::Validate;

use crate::app::AppState;
use crate::error::{is_unique_violation, ApiError};
use crate::extractors::{AdminAuth, UserAuth};

/// Shortest autocomplete term that triggers a lookup.
const MIN_AUTOCOMPLETE_TERM: usize = 2;

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub success: bool,
    pub deleted_count: u64,
}

/// GET /api/v1/items
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListItemsQuery>,
    _auth: UserAuth,
) -> Result<Json<Vec<ItemView>>, ApiError> {
    let rows = state.items.list(&query).await?;
    Ok(Json(rows.into_iter().map(ItemView::from).collect()))
}

/// GET /api/v1/items/count-today
pub async fn count_today(
    State(state): State<AppState>,
    _auth: UserAuth,
) -> Result<Json<ItemCountResponse>, ApiError> {
    let midnight = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
    let count = state.items.count_created_since(midnight).await?;
    Ok(Json(ItemCountResponse { count }))
}

/// GET /api/v1/items/autocomplete?term=
pub async fn autocomplete(
    State(state): State<AppState>,
    Query(query): Query<AutocompleteQuery>,
    _auth: UserAuth,
) -> Result<Json<Vec<ItemSuggestion>>, ApiError> {
    let term = query.term.trim();
    if term.chars().count() < MIN_AUTOCOMPLETE_TERM {
        return Ok(Json(Vec::new()));
    }

    let suggestions = state
        .items
        .autocomplete(term)
        .await?
        .into_iter()
        .map(|row| {
            let view = ItemView::from(row);
            ItemSuggestion {
                id: view.item.id,
                name: view.item.name,
                stock: view.item.stock,
                location_info: view.location_info,
            }
        })
        .collect();
    Ok(Json(suggestions))
}

/// GET /api/v1/items/:id
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    _auth: UserAuth,
) -> Result<Json<ItemView>, ApiError> {
    Ok(Json(load_view(&state, id).await?))
}

/// POST /api/v1/items
///
/// Temporary items ignore any location fields; permanent items need a
/// consistent zone/furniture/drawer triple.
pub async fn create_item(
    State(state): State<AppState>,
    AdminAuth(auth): AdminAuth,
    Json(request): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemView>), ApiError> {
    request.validate()?;
    let name = checked_name(&state, &request.name)?;

    let item = if request.is_temporary {
        state.items.create_temporary(&name, request.stock).await?
    } else {
        let placement = request.placement().ok_or_else(|| {
            ApiError::Validation(
                "Permanent items need zone_id, furniture_id and drawer_id".to_string(),
            )
        })?;
        ensure_placement(&state, placement).await?;
        state
            .items
            .create_permanent(&name, request.stock, placement)
            .await
            .map_err(|e| duplicate_item(e, &name))?
    };

    info!(
        item_id = item.id,
        admin_id = auth.actor.user_id,
        is_temporary = item.is_temporary,
        stock = item.stock,
        "Item created"
    );

    Ok((StatusCode::CREATED, Json(load_view(&state, item.id).await?)))
}

/// POST /api/v1/items/batch
///
/// Creates permanent items one by one. Entries that are incomplete, point
/// at an inconsistent location or duplicate an existing item are skipped.
pub async fn batch_create_items(
    State(state): State<AppState>,
    AdminAuth(auth): AdminAuth,
    Json(request): Json<BatchCreateItemsRequest>,
) -> Result<Json<BatchCreateItemsResponse>, ApiError> {
    request.validate()?;

    let mut added_count = 0;
    let mut skipped_count = 0;
    for (index, entry) in request.items.iter().enumerate() {
        let Some((name, stock, placement)) = batch_entry(&state, entry) else {
            skipped_count += 1;
            continue;
        };
        if !state.locations.placement_exists(placement).await? {
            skipped_count += 1;
            continue;
        }
        match state.items.create_permanent(&name, stock, placement).await {
            Ok(_) => added_count += 1,
            Err(e) if is_unique_violation(&e) => {
                warn!(entry = index, name = %name, "Batch entry duplicates an existing item");
                skipped_count += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(
        admin_id = auth.actor.user_id,
        added_count, skipped_count, "Batch item creation finished"
    );

    Ok(Json(BatchCreateItemsResponse {
        success: added_count > 0,
        message: format!("Added {} item(s), skipped {}", added_count, skipped_count),
        added_count,
        skipped_count,
    }))
}

/// PUT /api/v1/items/:id
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AdminAuth(auth): AdminAuth,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<ItemView>, ApiError> {
    request.validate()?;
    let name = checked_name(&state, &request.name)?;

    let existing = state
        .items
        .find_by_id(id)
        .await?
        .ok_or_else(|| item_not_found(id))?;
    if existing.is_temporary {
        return Err(ApiError::Unprocessable(
            "Temporary items cannot be edited".to_string(),
        ));
    }

    let placement = request.placement();
    ensure_placement(&state, placement).await?;
    state
        .items
        .update_permanent(id, &name, placement)
        .await
        .map_err(|e| duplicate_item(e, &name))?
        .ok_or_else(|| item_not_found(id))?;

    info!(item_id = id, admin_id = auth.actor.user_id, "Item updated");
    Ok(Json(load_view(&state, id).await?))
}

/// DELETE /api/v1/items/:id
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AdminAuth(auth): AdminAuth,
) -> Result<StatusCode, ApiError> {
    let item = state
        .items
        .find_by_id(id)
        .await?
        .ok_or_else(|| item_not_found(id))?;

    if state.items.delete_if_unborrowed(id).await? == 0 {
        let open_loans = state.items.count_open_loans(id).await?;
        if open_loans == 0 {
            return Err(item_not_found(id));
        }
        return Err(ApiError::Conflict(format!(
            "Item '{}' has {} open loan(s)",
            item.name, open_loans
        )));
    }

    info!(item_id = id, admin_id = auth.actor.user_id, "Item deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/items/temporary
pub async fn purge_temporary_items(
    State(state): State<AppState>,
    AdminAuth(auth): AdminAuth,
) -> Result<Json<PurgeResponse>, ApiError> {
    let deleted_count = state.items.purge_unborrowed_temporary().await?;
    info!(
        admin_id = auth.actor.user_id,
        deleted_count, "Temporary items purged"
    );
    Ok(Json(PurgeResponse {
        success: true,
        deleted_count,
    }))
}

pub(crate) async fn load_view(state: &AppState, id: i64) -> Result<ItemView, ApiError> {
    state
        .items
        .find_view(id)
        .await?
        .map(ItemView::from)
        .ok_or_else(|| item_not_found(id))
}

fn item_not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Item {} not found", id))
}

fn checked_name(state: &AppState, raw: &str) -> Result<String, ApiError> {
    let name = normalize_name(raw)
        .ok_or_else(|| ApiError::Validation("name: Must not be blank".to_string()))?;
    let max = state.config.limits.max_name_length;
    if name.chars().count() > max {
        return Err(ApiError::Validation(format!(
            "name: Must be at most {} characters",
            max
        )));
    }
    Ok(name)
}

async fn ensure_placement(state: &AppState, placement: Placement) -> Result<(), ApiError> {
    if state.locations.placement_exists(placement).await? {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "The drawer must belong to the furniture and the furniture to the zone".to_string(),
        ))
    }
}

fn duplicate_item(err: sqlx::Error, name: &str) -> ApiError {
    if is_unique_violation(&err) {
        ApiError::Conflict(format!(
            "An item named '{}' already exists at this location",
            name
        ))
    } else {
        err.into()
    }
}

/// Name, stock and placement of a usable batch entry.
fn batch_entry(state: &AppState, entry: &BatchItemEntry) -> Option<(String, i32, Placement)> {
    let name = checked_name(state, entry.name.as_deref()?).ok()?;
    let stock = entry.stock.unwrap_or(1);
    if stock < 0 {
        return None;
    }
    let placement = Placement {
        zone_id: entry.zone_id?,
        furniture_id: entry.furniture_id?,
        drawer_id: entry.drawer_id?,
    };
    Some((name, stock, placement))
}
