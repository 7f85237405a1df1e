//! Stock adjustment models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::ParseEnumError;

/// Adjustment status. Adjustments are posted on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentStatus {
    Draft,
    Posted,
    Cancelled,
}

impl AdjustmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentStatus::Draft => "draft",
            AdjustmentStatus::Posted => "posted",
            AdjustmentStatus::Cancelled => "cancelled",
        }
    }

    /// Cancelled adjustments are frozen
    pub fn is_editable(&self) -> bool {
        !matches!(self, AdjustmentStatus::Cancelled)
    }
}

impl FromStr for AdjustmentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(AdjustmentStatus::Draft),
            "posted" => Ok(AdjustmentStatus::Posted),
            "cancelled" => Ok(AdjustmentStatus::Cancelled),
            other => Err(ParseEnumError::new("adjustment status", other)),
        }
    }
}

/// Direction of an adjustment line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }

    /// Split `qty` into `(qty_in, qty_out)`
    pub fn split(&self, qty: Decimal) -> (Decimal, Decimal) {
        match self {
            Direction::In => (qty, Decimal::ZERO),
            Direction::Out => (Decimal::ZERO, qty),
        }
    }
}

impl FromStr for Direction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            other => Err(ParseEnumError::new("direction", other)),
        }
    }
}

/// A stock adjustment header with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub id: i64,
    pub uuid: Uuid,
    pub code: String,
    pub date: NaiveDate,
    pub warehouse_id: i64,
    pub adjustment_type_id: i64,
    pub branch_id: Option<i64>,
    pub description: Option<String>,
    pub status: AdjustmentStatus,
    pub details: Vec<StockAdjustmentDetail>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One adjustment line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAdjustmentDetail {
    pub id: i64,
    pub product_id: i64,
    pub direction: Direction,
    pub batch_number: Option<String>,
    pub unit_id: i64,
    pub qty: Decimal,
    pub unit_cost: Decimal,
    pub description: Option<String>,
}
