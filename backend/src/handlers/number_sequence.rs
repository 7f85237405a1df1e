//! HTTP handlers for number sequence endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use shared::models::NumberSequence;
use shared::types::{PaginatedResponse, Pagination};

use crate::error::{AppError, AppResult};
use crate::middleware::{check_permission, CurrentUser};
use crate::services::number_sequence::{
    CreateSequenceInput, GeneratedCode, PreviewFormatInput, PreviewFormatResponse,
    UpdateSequenceInput,
};
use crate::services::{Actor, NumberSequenceService};
use crate::AppState;

const RESOURCE: &str = "number-sequence";

/// Branch and date a code is minted for
#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    pub branch_id: Option<i64>,
    pub date: Option<NaiveDate>,
}

/// List number sequences
pub async fn list_sequences(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<NumberSequence>>> {
    check_permission(&current_user.0, RESOURCE, "read")?;
    let service = NumberSequenceService::new(state.db);
    Ok(Json(service.list(&pagination).await?))
}

/// List active number sequences
pub async fn list_active_sequences(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<NumberSequence>>> {
    check_permission(&current_user.0, RESOURCE, "read")?;
    let service = NumberSequenceService::new(state.db);
    Ok(Json(service.list_active().await?))
}

pub async fn get_sequence(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<NumberSequence>> {
    check_permission(&current_user.0, RESOURCE, "read")?;
    let service = NumberSequenceService::new(state.db);
    Ok(Json(service.get(id).await?))
}

/// Create a number sequence
pub async fn create_sequence(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSequenceInput>,
) -> AppResult<(StatusCode, Json<NumberSequence>)> {
    check_permission(&current_user.0, RESOURCE, "create")?;
    let service = NumberSequenceService::new(state.db);
    let sequence = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(sequence)))
}

pub async fn update_sequence(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateSequenceInput>,
) -> AppResult<Json<NumberSequence>> {
    check_permission(&current_user.0, RESOURCE, "update")?;
    let service = NumberSequenceService::new(state.db);
    Ok(Json(service.update(id, input).await?))
}

pub async fn delete_sequence(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    check_permission(&current_user.0, RESOURCE, "delete")?;
    let service = NumberSequenceService::new(state.db);
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Render a format with sample values
pub async fn preview_sequence_format(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<PreviewFormatInput>,
) -> AppResult<Json<PreviewFormatResponse>> {
    check_permission(&current_user.0, RESOURCE, "read")?;
    let service = NumberSequenceService::new(state.db);
    Ok(Json(service.preview_format(&input)?))
}

/// Next code of a sequence without consuming it; `null` for an unknown or
/// inactive sequence
pub async fn peek_code(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(code): Path<String>,
    Query(scope): Query<ScopeQuery>,
) -> AppResult<Json<Option<GeneratedCode>>> {
    check_permission(&current_user.0, RESOURCE, "read")?;
    let service = NumberSequenceService::new(state.db);
    match service
        .peek(&code, scope.branch_id, scope.date, Actor::from(&current_user.0))
        .await
    {
        Ok(generated) => Ok(Json(Some(generated))),
        Err(AppError::NotFound(_)) => Ok(Json(None)),
        Err(e) => Err(e),
    }
}

/// Mint the next code of a sequence
pub async fn generate_code(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(code): Path<String>,
    Query(scope): Query<ScopeQuery>,
) -> AppResult<Json<GeneratedCode>> {
    check_permission(&current_user.0, RESOURCE, "generate")?;
    let service = NumberSequenceService::new(state.db);
    let generated = service
        .generate(&code, scope.branch_id, scope.date, Actor::from(&current_user.0))
        .await?;
    Ok(Json(generated))
}
