//! Admin stock changes and the stock report.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::item::{AdjustStockRequest, SetStockRequest, StockReport};
use domain::models::ItemView;
use domain::services::StockChange;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminAuth, UserAuth};
use crate::middleware::metrics::record_stock_alerts;

/// PUT /api/v1/items/:id/stock
pub async fn set_stock(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AdminAuth(auth): AdminAuth,
    Json(request): Json<SetStockRequest>,
) -> Result<Json<StockChange>, ApiError> {
    request.validate()?;
    let change = state.stock_service.set_stock(id, request.stock).await?;
    record_stock_alerts(change.notifications.len());

    info!(
        item_id = id,
        admin_id = auth.actor.user_id,
        old_stock = change.old_stock,
        new_stock = change.new_stock,
        "Stock set"
    );
    Ok(Json(change))
}

/// POST /api/v1/items/:id/stock/adjust
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AdminAuth(auth): AdminAuth,
    Json(request): Json<AdjustStockRequest>,
) -> Result<Json<StockChange>, ApiError> {
    request.validate()?;
    let change = state
        .stock_service
        .adjust_stock(id, request.adjustment)
        .await?;
    record_stock_alerts(change.notifications.len());

    info!(
        item_id = id,
        admin_id = auth.actor.user_id,
        adjustment = request.adjustment,
        new_stock = change.new_stock,
        "Stock adjusted"
    );
    Ok(Json(change))
}

/// GET /api/v1/stock/report
pub async fn stock_report(
    State(state): State<AppState>,
    _auth: UserAuth,
) -> Result<Json<StockReport>, ApiError> {
    let policy = *state.stock_service.policy();
    let rows = state
        .items
        .stock_report(policy.exhausted_threshold, policy.low_stock_threshold)
        .await?;

    Ok(Json(StockReport {
        out_of_stock: rows.out_of_stock.into_iter().map(ItemView::from).collect(),
        low_stock: rows.low_stock.into_iter().map(ItemView::from).collect(),
        total_items: rows.total_items,
        exhausted_threshold: policy.exhausted_threshold,
        low_stock_threshold: policy.low_stock_threshold,
    }))
}
