//! HTTP handlers for stock ledger queries

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shared::models::{BatchAvailability, DocumentKind, LaneKey, StockLedgerEntry};

use crate::error::AppResult;
use crate::middleware::{check_permission, CurrentUser};
use crate::services::StockLedgerService;
use crate::AppState;

const RESOURCE: &str = "stock-ledger";

#[derive(Debug, Deserialize)]
pub struct BatchesQuery {
    pub product_id: i64,
    pub warehouse_id: i64,
}

/// One lane, optionally evaluated as of a date
#[derive(Debug, Deserialize)]
pub struct LaneQuery {
    pub product_id: i64,
    pub warehouse_id: i64,
    pub batch_number: Option<String>,
    pub as_of: Option<NaiveDate>,
}

impl LaneQuery {
    fn lane(&self) -> LaneKey {
        LaneKey::new(self.product_id, self.warehouse_id, self.batch_number.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct EntriesQuery {
    pub ref_type: DocumentKind,
    pub ref_id: i64,
}

#[derive(Debug, Serialize)]
pub struct AvailableQtyResponse {
    pub lane: LaneKey,
    pub as_of: NaiveDate,
    pub available_qty: Decimal,
}

/// Batches with positive stock for a product in a warehouse
pub async fn list_available_batches(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<BatchesQuery>,
) -> AppResult<Json<Vec<BatchAvailability>>> {
    check_permission(&current_user.0, RESOURCE, "read")?;
    let service = StockLedgerService::new(state.db);
    let batches = service
        .available_batches(query.product_id, query.warehouse_id)
        .await?;
    Ok(Json(batches))
}

/// Base quantity available on a lane at the end of a day
pub async fn get_available_qty(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<LaneQuery>,
) -> AppResult<Json<AvailableQtyResponse>> {
    check_permission(&current_user.0, RESOURCE, "read")?;
    let service = StockLedgerService::new(state.db);
    let lane = query.lane();
    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let available_qty = service.check_available_qty(&lane, as_of).await?;
    Ok(Json(AvailableQtyResponse {
        lane,
        as_of,
        available_qty,
    }))
}

/// Ledger rows written for a document, reversals included
pub async fn list_entries_by_ref(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<EntriesQuery>,
) -> AppResult<Json<Vec<StockLedgerEntry>>> {
    check_permission(&current_user.0, RESOURCE, "read")?;
    let service = StockLedgerService::new(state.db);
    Ok(Json(service.entries_by_ref(query.ref_type, query.ref_id).await?))
}

/// Full movement history of a lane
pub async fn get_lane_history(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<LaneQuery>,
) -> AppResult<Json<Vec<StockLedgerEntry>>> {
    check_permission(&current_user.0, RESOURCE, "read")?;
    let service = StockLedgerService::new(state.db);
    Ok(Json(service.lane_history(&query.lane()).await?))
}
