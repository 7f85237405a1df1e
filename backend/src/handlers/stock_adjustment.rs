//! HTTP handlers for stock adjustment endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use shared::models::StockAdjustment;
use shared::types::PaginatedResponse;

use crate::error::AppResult;
use crate::middleware::{check_permission, CurrentUser};
use crate::services::stock_adjustment::{AdjustmentFilter, AdjustmentInput};
use crate::services::{Actor, StockAdjustmentService};
use crate::AppState;

const RESOURCE: &str = "stock-adjustment";

fn service(state: AppState) -> StockAdjustmentService {
    let sequence_code = state.config.inventory.adjustment_sequence_code.clone();
    StockAdjustmentService::new(state.db, sequence_code)
}

pub async fn list_adjustments(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<AdjustmentFilter>,
) -> AppResult<Json<PaginatedResponse<StockAdjustment>>> {
    check_permission(&current_user.0, RESOURCE, "read")?;
    Ok(Json(service(state).list(&filter).await?))
}

pub async fn get_adjustment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<StockAdjustment>> {
    check_permission(&current_user.0, RESOURCE, "read")?;
    Ok(Json(service(state).get(id).await?))
}

/// Create and post a stock adjustment
pub async fn create_adjustment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<AdjustmentInput>,
) -> AppResult<(StatusCode, Json<StockAdjustment>)> {
    check_permission(&current_user.0, RESOURCE, "create")?;
    let adjustment = service(state)
        .create(Actor::from(&current_user.0), input)
        .await?;
    Ok((StatusCode::CREATED, Json(adjustment)))
}

/// Replace an adjustment; its previous postings are reversed
pub async fn update_adjustment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<AdjustmentInput>,
) -> AppResult<Json<StockAdjustment>> {
    check_permission(&current_user.0, RESOURCE, "update")?;
    let adjustment = service(state)
        .update(id, Actor::from(&current_user.0), input)
        .await?;
    Ok(Json(adjustment))
}

pub async fn delete_adjustment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    check_permission(&current_user.0, RESOURCE, "delete")?;
    service(state)
        .delete(id, Actor::from(&current_user.0))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
