//! Stock transfer models and the draft/posted workflow

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ParseEnumError;

/// Code prefixes marking a transfer that has not received its real number yet
pub const PLACEHOLDER_PREFIXES: [&str; 2] = ["AUTOCODE/", "DRAFT-"];

/// Whether `code` is a placeholder to be replaced on approval
pub fn is_placeholder_code(code: &str) -> bool {
    PLACEHOLDER_PREFIXES.iter().any(|p| code.starts_with(p))
}

/// Placeholder code for a transfer created without one
pub fn placeholder_code(token: &str) -> String {
    format!("DRAFT-{}", token)
}

/// Transfer status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Draft,
    Posted,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Draft => "draft",
            TransferStatus::Posted => "posted",
        }
    }

    /// Validate `action` against the current status and return the status
    /// the document ends up in.
    pub fn apply(self, action: TransferAction) -> Result<TransferStatus, TransitionError> {
        use TransferAction::*;
        use TransferStatus::*;

        match (self, action) {
            (Draft, Update) => Ok(Draft),
            (Draft, Delete) => Ok(Draft),
            (Draft, Approve) => Ok(Posted),
            (Posted, Disapprove) => Ok(Draft),
            (status, action) => Err(TransitionError { status, action }),
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(TransferStatus::Draft),
            "posted" => Ok(TransferStatus::Posted),
            other => Err(ParseEnumError::new("transfer status", other)),
        }
    }
}

/// Operations on a transfer that depend on its status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferAction {
    Update,
    Delete,
    Approve,
    Disapprove,
}

impl TransferAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferAction::Update => "update",
            TransferAction::Delete => "delete",
            TransferAction::Approve => "approve",
            TransferAction::Disapprove => "disapprove",
        }
    }
}

impl FromStr for TransferAction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "update" => Ok(TransferAction::Update),
            "delete" => Ok(TransferAction::Delete),
            "approve" => Ok(TransferAction::Approve),
            "disapprove" => Ok(TransferAction::Disapprove),
            other => Err(ParseEnumError::new("transfer action", other)),
        }
    }
}

/// An action attempted outside its legal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {} a {status} stock transfer", .action.as_str())]
pub struct TransitionError {
    pub status: TransferStatus,
    pub action: TransferAction,
}

/// A stock transfer header with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTransfer {
    pub id: i64,
    pub uuid: Uuid,
    pub code: String,
    pub date: NaiveDate,
    pub from_warehouse_id: i64,
    pub to_warehouse_id: i64,
    pub description: Option<String>,
    pub status: TransferStatus,
    pub branch_id: Option<i64>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub details: Vec<StockTransferDetail>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockTransfer {
    pub fn has_placeholder_code(&self) -> bool {
        is_placeholder_code(&self.code)
    }
}

/// One transfer line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTransferDetail {
    pub id: i64,
    pub product_id: i64,
    pub batch_number: Option<String>,
    pub unit_id: i64,
    pub qty: Decimal,
    pub unit_cost: Decimal,
    pub description: Option<String>,
}

/// Compact line view used in the activity diff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailSnapshot {
    pub product_id: i64,
    pub qty: Decimal,
    pub unit_id: i64,
    pub batch: Option<String>,
}

impl From<&StockTransferDetail> for DetailSnapshot {
    fn from(d: &StockTransferDetail) -> Self {
        Self {
            product_id: d.product_id,
            qty: d.qty,
            unit_id: d.unit_id,
            batch: d.batch_number.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_transitions() {
        assert_eq!(TransferStatus::Draft.apply(TransferAction::Update), Ok(TransferStatus::Draft));
        assert_eq!(TransferStatus::Draft.apply(TransferAction::Delete), Ok(TransferStatus::Draft));
        assert_eq!(TransferStatus::Draft.apply(TransferAction::Approve), Ok(TransferStatus::Posted));
        assert!(TransferStatus::Draft.apply(TransferAction::Disapprove).is_err());
    }

    #[test]
    fn test_posted_transitions() {
        assert_eq!(
            TransferStatus::Posted.apply(TransferAction::Disapprove),
            Ok(TransferStatus::Draft)
        );
        for action in [TransferAction::Update, TransferAction::Delete, TransferAction::Approve] {
            let err = TransferStatus::Posted.apply(action).unwrap_err();
            assert_eq!(err.status, TransferStatus::Posted);
            assert_eq!(err.action, action);
        }
    }

    #[test]
    fn test_transition_error_message() {
        let err = TransferStatus::Posted.apply(TransferAction::Approve).unwrap_err();
        assert_eq!(err.to_string(), "cannot approve a posted stock transfer");
    }

    #[test]
    fn test_placeholder_codes() {
        assert!(is_placeholder_code("AUTOCODE/1"));
        assert!(is_placeholder_code(&placeholder_code("abc123")));
        assert!(!is_placeholder_code("TRF/BDG/2026/03/0001"));
    }
}
