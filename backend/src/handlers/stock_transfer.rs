//! HTTP handlers for stock transfer endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use shared::models::{ActivityLog, DocumentKind, StockTransfer};
use shared::types::PaginatedResponse;

use crate::error::AppResult;
use crate::middleware::{check_permission, CurrentUser};
use crate::services::stock_transfer::{TransferFilter, TransferInput};
use crate::services::{ActivityLogService, Actor, StockTransferService};
use crate::AppState;

const RESOURCE: &str = "stock-transfer";

fn service(state: AppState) -> StockTransferService {
    let sequence_code = state.config.inventory.transfer_sequence_code.clone();
    StockTransferService::new(state.db, sequence_code)
}

pub async fn list_transfers(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<TransferFilter>,
) -> AppResult<Json<PaginatedResponse<StockTransfer>>> {
    check_permission(&current_user.0, RESOURCE, "read")?;
    Ok(Json(service(state).list(&filter).await?))
}

pub async fn get_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<StockTransfer>> {
    check_permission(&current_user.0, RESOURCE, "read")?;
    Ok(Json(service(state).get(id).await?))
}

/// Save a draft transfer
pub async fn create_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<TransferInput>,
) -> AppResult<(StatusCode, Json<StockTransfer>)> {
    check_permission(&current_user.0, RESOURCE, "create")?;
    let transfer = service(state)
        .create(Actor::from(&current_user.0), input)
        .await?;
    Ok((StatusCode::CREATED, Json(transfer)))
}

pub async fn update_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<TransferInput>,
) -> AppResult<Json<StockTransfer>> {
    check_permission(&current_user.0, RESOURCE, "update")?;
    let transfer = service(state)
        .update(id, Actor::from(&current_user.0), input)
        .await?;
    Ok(Json(transfer))
}

pub async fn delete_transfer(
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

/// Post a draft transfer to the ledger
pub async fn approve_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<StockTransfer>> {
    check_permission(&current_user.0, RESOURCE, "approve")?;
    let transfer = service(state)
        .approve(id, Actor::from(&current_user.0))
        .await?;
    Ok(Json(transfer))
}

/// Take a posted transfer back to draft
pub async fn disapprove_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<StockTransfer>> {
    check_permission(&current_user.0, RESOURCE, "approve")?;
    let transfer = service(state)
        .disapprove(id, Actor::from(&current_user.0))
        .await?;
    Ok(Json(transfer))
}

/// Audit trail of a transfer
pub async fn get_transfer_activity(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<ActivityLog>>> {
    check_permission(&current_user.0, RESOURCE, "read")?;
    let service = ActivityLogService::new(state.db);
    let activity = service
        .for_subject(DocumentKind::StockTransfer, id)
        .await?;
    Ok(Json(activity))
}
