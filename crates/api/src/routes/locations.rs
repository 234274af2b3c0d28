//! Zone, furniture and drawer routes.
//!
//! Deleting a level that still holds items is refused with an `in_use`
//! error listing the first items found there.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::location::{
    in_use_message, CreateDrawerRequest, CreateFurnitureRequest, CreateZoneRequest, ItemRef,
    ListDrawersQuery, ListFurnitureQuery, IN_USE_LISTED_ITEMS,
};
use domain::models::{Drawer, Furniture, Zone};
use persistence::repositories::LocationLevel;
use shared::validation::normalize_name;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::{is_foreign_key_violation, is_unique_violation, ApiError};
use crate::extractors::{AdminAuth, UserAuth};

/// GET /api/v1/locations/zones
pub async fn list_zones(
    State(state): State<AppState>,
    _auth: UserAuth,
) -> Result<Json<Vec<Zone>>, ApiError> {
    let zones = state.locations.list_zones().await?;
    Ok(Json(zones.into_iter().map(Zone::from).collect()))
}

/// POST /api/v1/locations/zones
pub async fn create_zone(
    State(state): State<AppState>,
    AdminAuth(auth): AdminAuth,
    Json(request): Json<CreateZoneRequest>,
) -> Result<(StatusCode, Json<Zone>), ApiError> {
    request.validate()?;
    let name = location_name(&request.name)?;

    let zone = state
        .locations
        .create_zone(&name, request.description.as_deref())
        .await
        .map_err(|e| duplicate_name(e, "zone", &name))?;

    info!(zone_id = zone.id, admin_id = auth.actor.user_id, "Zone created");
    Ok((StatusCode::CREATED, Json(zone.into())))
}

/// DELETE /api/v1/locations/zones/:id
pub async fn delete_zone(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AdminAuth(auth): AdminAuth,
) -> Result<StatusCode, ApiError> {
    let zone = state
        .locations
        .find_zone(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Zone {} not found", id)))?;
    ensure_empty(&state, LocationLevel::Zone, id, &zone.name).await?;

    let deleted = state
        .locations
        .delete_zone(id)
        .await
        .map_err(|e| still_referenced(e, LocationLevel::Zone, &zone.name))?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("Zone {} not found", id)));
    }

    info!(zone_id = id, admin_id = auth.actor.user_id, "Zone deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/locations/furniture?zone_id=
pub async fn list_furniture(
    State(state): State<AppState>,
    Query(query): Query<ListFurnitureQuery>,
    _auth: UserAuth,
) -> Result<Json<Vec<Furniture>>, ApiError> {
    let furniture = state.locations.list_furniture(query.zone_id).await?;
    Ok(Json(furniture.into_iter().map(Furniture::from).collect()))
}

/// POST /api/v1/locations/furniture
pub async fn create_furniture(
    State(state): State<AppState>,
    AdminAuth(auth): AdminAuth,
    Json(request): Json<CreateFurnitureRequest>,
) -> Result<(StatusCode, Json<Furniture>), ApiError> {
    request.validate()?;
    let name = location_name(&request.name)?;

    let furniture = state
        .locations
        .create_furniture(&name, request.description.as_deref(), request.zone_id)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                ApiError::NotFound(format!("Zone {} not found", request.zone_id))
            } else {
                duplicate_name(e, "furniture", &name)
            }
        })?;

    info!(
        furniture_id = furniture.id,
        zone_id = furniture.zone_id,
        admin_id = auth.actor.user_id,
        "Furniture created"
    );
    Ok((StatusCode::CREATED, Json(furniture.into())))
}

/// DELETE /api/v1/locations/furniture/:id
pub async fn delete_furniture(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AdminAuth(auth): AdminAuth,
) -> Result<StatusCode, ApiError> {
    let furniture = state
        .locations
        .find_furniture(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Furniture {} not found", id)))?;
    ensure_empty(&state, LocationLevel::Furniture, id, &furniture.name).await?;

    let deleted = state
        .locations
        .delete_furniture(id)
        .await
        .map_err(|e| still_referenced(e, LocationLevel::Furniture, &furniture.name))?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("Furniture {} not found", id)));
    }

    info!(furniture_id = id, admin_id = auth.actor.user_id, "Furniture deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/locations/drawers?furniture_id=
pub async fn list_drawers(
    State(state): State<AppState>,
    Query(query): Query<ListDrawersQuery>,
    _auth: UserAuth,
) -> Result<Json<Vec<Drawer>>, ApiError> {
    let drawers = state.locations.list_drawers(query.furniture_id).await?;
    Ok(Json(drawers.into_iter().map(Drawer::from).collect()))
}

/// POST /api/v1/locations/drawers
pub async fn create_drawer(
    State(state): State<AppState>,
    AdminAuth(auth): AdminAuth,
    Json(request): Json<CreateDrawerRequest>,
) -> Result<(StatusCode, Json<Drawer>), ApiError> {
    request.validate()?;
    let name = location_name(&request.name)?;

    let drawer = state
        .locations
        .create_drawer(&name, request.description.as_deref(), request.furniture_id)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                ApiError::NotFound(format!("Furniture {} not found", request.furniture_id))
            } else {
                duplicate_name(e, "drawer", &name)
            }
        })?;

    info!(
        drawer_id = drawer.id,
        furniture_id = drawer.furniture_id,
        admin_id = auth.actor.user_id,
        "Drawer created"
    );
    Ok((StatusCode::CREATED, Json(drawer.into())))
}

/// DELETE /api/v1/locations/drawers/:id
pub async fn delete_drawer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AdminAuth(auth): AdminAuth,
) -> Result<StatusCode, ApiError> {
    let drawer = state
        .locations
        .find_drawer(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Drawer {} not found", id)))?;
    ensure_empty(&state, LocationLevel::Drawer, id, &drawer.name).await?;

    let deleted = state
        .locations
        .delete_drawer(id)
        .await
        .map_err(|e| still_referenced(e, LocationLevel::Drawer, &drawer.name))?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("Drawer {} not found", id)));
    }

    info!(drawer_id = id, admin_id = auth.actor.user_id, "Drawer deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn location_name(raw: &str) -> Result<String, ApiError> {
    normalize_name(raw).ok_or_else(|| ApiError::Validation("name: Must not be blank".to_string()))
}

/// Refuses deletion while items are stored at the location.
async fn ensure_empty(
    state: &AppState,
    level: LocationLevel,
    id: i64,
    name: &str,
) -> Result<(), ApiError> {
    let (items, item_count) = state
        .locations
        .items_at(level, id, IN_USE_LISTED_ITEMS as i64)
        .await?;
    if item_count == 0 {
        return Ok(());
    }

    let items: Vec<ItemRef> = items.into_iter().map(ItemRef::from).collect();
    Err(ApiError::InUse {
        message: in_use_message(level.label(), name, &items, item_count),
        items,
        item_count,
    })
}

fn duplicate_name(err: sqlx::Error, kind: &str, name: &str) -> ApiError {
    if is_unique_violation(&err) {
        ApiError::Conflict(format!("A {} named '{}' already exists here", kind, name))
    } else {
        err.into()
    }
}

/// An item was stored at the location between the check and the delete.
fn still_referenced(err: sqlx::Error, level: LocationLevel, name: &str) -> ApiError {
    if is_foreign_key_violation(&err) {
        ApiError::Conflict(format!(
            "Cannot delete {} '{}': items are stored there",
            level.label(),
            name
        ))
    } else {
        err.into()
    }
}
