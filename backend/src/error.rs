//! Error handling for the ERP stock service
//!
//! Every failure surfaces as `{ "error": { "code", "message", ... } }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use shared::models::{AmountOverflow, ParseEnumError, StockShortfall, TransitionError};

/// PostgreSQL `lock_not_available`
const SQLSTATE_LOCK_NOT_AVAILABLE: &str = "55P03";
/// PostgreSQL `query_canceled`, raised when `statement_timeout` fires
const SQLSTATE_QUERY_CANCELED: &str = "57014";
const SQLSTATE_DEADLOCK_DETECTED: &str = "40P01";
const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL `numeric_value_out_of_range`
const SQLSTATE_NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationErrors(#[from] validator::ValidationErrors),

    #[error("Conflict: {message}")]
    Conflict { resource: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error(
        "Insufficient stock for product #{product_id} in warehouse #{warehouse_id}: available {available}, required {required}"
    )]
    InsufficientStock {
        product_id: i64,
        warehouse_id: i64,
        batch_number: Option<String>,
        available: Decimal,
        required: Decimal,
    },

    #[error(
        "Stock of product #{product_id} in warehouse #{warehouse_id} was already consumed: minimum balance {min_balance}, to remove {to_remove}"
    )]
    StockAlreadyConsumed {
        product_id: i64,
        warehouse_id: i64,
        batch_number: Option<String>,
        min_balance: Decimal,
        to_remove: Decimal,
    },

    #[error("Lock wait exceeded, retry the request")]
    ConcurrencyTimeout,

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Whether the caller may retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::ConcurrencyTimeout)
    }

    /// Disapproval guard failure for a lane
    pub fn already_consumed(shortfall: StockShortfall) -> Self {
        AppError::StockAlreadyConsumed {
            product_id: shortfall.lane.product_id,
            warehouse_id: shortfall.lane.warehouse_id,
            batch_number: shortfall.lane.batch_number,
            min_balance: shortfall.available,
            to_remove: shortfall.required,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let classified = err.as_database_error().map(|db_err| {
            (
                db_err.code().map(|code| code.into_owned()),
                db_err.constraint().map(str::to_string),
            )
        });
        let Some((code, constraint)) = classified else {
            return AppError::DatabaseError(err);
        };

        match code.as_deref() {
            Some(SQLSTATE_LOCK_NOT_AVAILABLE | SQLSTATE_QUERY_CANCELED | SQLSTATE_DEADLOCK_DETECTED) => {
                AppError::ConcurrencyTimeout
            }
            Some(SQLSTATE_UNIQUE_VIOLATION) => AppError::Conflict {
                resource: constraint.unwrap_or_else(|| "record".to_string()),
                message: "A record with the same unique value already exists".to_string(),
            },
            Some(SQLSTATE_NUMERIC_OUT_OF_RANGE) => {
                AppError::validation("qty", "Quantity or value exceeds the stored precision")
            }
            _ => AppError::DatabaseError(err),
        }
    }
}

impl From<AmountOverflow> for AppError {
    fn from(err: AmountOverflow) -> Self {
        AppError::validation("qty", err.to_string())
    }
}

impl From<StockShortfall> for AppError {
    fn from(shortfall: StockShortfall) -> Self {
        AppError::InsufficientStock {
            product_id: shortfall.lane.product_id,
            warehouse_id: shortfall.lane.warehouse_id,
            batch_number: shortfall.lane.batch_number,
            available: shortfall.available,
            required: shortfall.required,
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::InvalidTransition(err.to_string())
    }
}

impl From<ParseEnumError> for AppError {
    fn from(err: ParseEnumError) -> Self {
        AppError::Internal(format!("Corrupt stored value: {}", err))
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl ErrorDetail {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
            details: None,
            retryable: None,
        }
    }

    fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl AppError {
    fn status_and_detail(&self) -> (StatusCode, ErrorDetail) {
        match self {
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("UNAUTHORIZED", msg.clone()),
            ),
            AppError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new("FORBIDDEN", msg.clone()),
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", message.clone()).with_field(field),
            ),
            AppError::ValidationErrors(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", "Request validation failed")
                    .with_details(json!(errors)),
            ),
            AppError::Conflict { resource, message } => (
                StatusCode::CONFLICT,
                ErrorDetail::new("CONFLICT", message.clone()).with_field(resource),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::InvalidTransition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("INVALID_STATE_TRANSITION", msg.clone()),
            ),
            AppError::InsufficientStock {
                product_id,
                warehouse_id,
                batch_number,
                available,
                required,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("INSUFFICIENT_STOCK", self.to_string()).with_details(json!({
                    "product_id": product_id,
                    "warehouse_id": warehouse_id,
                    "batch_number": batch_number,
                    "available": available,
                    "required": required,
                    "shortfall": required - available,
                })),
            ),
            AppError::StockAlreadyConsumed {
                product_id,
                warehouse_id,
                batch_number,
                min_balance,
                to_remove,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("INSUFFICIENT_STOCK", self.to_string()).with_details(json!({
                    "product_id": product_id,
                    "warehouse_id": warehouse_id,
                    "batch_number": batch_number,
                    "min_balance": min_balance,
                    "to_remove": to_remove,
                })),
            ),
            AppError::ConcurrencyTimeout => {
                let mut detail = ErrorDetail::new(
                    "CONCURRENCY_TIMEOUT",
                    "The resource is busy, please retry the request",
                );
                detail.retryable = Some(true);
                (StatusCode::SERVICE_UNAVAILABLE, detail)
            }
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("DATABASE_ERROR", "A database error occurred"),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg.clone()),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred"),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = self.status_and_detail();

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::LaneKey;

    #[test]
    fn test_shortfall_maps_to_insufficient_stock() {
        let err: AppError = StockShortfall {
            lane: LaneKey::new(7, 2, Some("B1")),
            available: Decimal::from(5),
            required: Decimal::from(8),
        }
        .into();

        let (status, detail) = err.status_and_detail();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(detail.code, "INSUFFICIENT_STOCK");
        let details = detail.details.unwrap();
        assert_eq!(details["batch_number"], "B1");
        assert_eq!(details["shortfall"], "3");
    }

    #[test]
    fn test_amount_overflow_is_validation_error() {
        let err: AppError = AmountOverflow {
            what: "base quantity",
            lhs: Decimal::MAX,
            rhs: Decimal::from(12),
        }
        .into();

        let (status, detail) = err.status_and_detail();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(detail.field.as_deref(), Some("qty"));
    }

    #[test]
    fn test_concurrency_timeout_is_retryable() {
        let err = AppError::ConcurrencyTimeout;
        assert!(err.is_retryable());
        let (status, detail) = err.status_and_detail();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(detail.retryable, Some(true));
    }

    #[test]
    fn test_row_not_found_is_database_error() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::DatabaseError(_)));
        assert!(!err.is_retryable());
    }
}
