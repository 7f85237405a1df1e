//! Business logic services for inventory stock accounting

pub mod activity;
pub mod number_sequence;
pub mod product_unit;
pub mod stock_adjustment;
pub mod stock_ledger;
pub mod stock_transfer;

pub use activity::ActivityLogService;
pub use number_sequence::NumberSequenceService;
pub use product_unit::ProductUnitLookup;
pub use stock_adjustment::StockAdjustmentService;
pub use stock_ledger::StockLedgerService;
pub use stock_transfer::StockTransferService;

use rust_decimal::Decimal;
use uuid::Uuid;
use validator::ValidationError;

use crate::middleware::AuthUser;

/// Who is acting, and the branch to fall back on
#[derive(Debug, Clone, Copy, Default)]
pub struct Actor {
    pub user_id: Option<Uuid>,
    pub branch_id: Option<i64>,
}

impl Actor {
    /// Background jobs and tests act without a session
    pub fn system() -> Self {
        Self::default()
    }
}

impl From<&AuthUser> for Actor {
    fn from(user: &AuthUser) -> Self {
        Self {
            user_id: Some(user.user_id),
            branch_id: user.branch_id,
        }
    }
}

pub(crate) fn positive_quantity(value: &Decimal) -> Result<(), ValidationError> {
    shared::validate_quantity(*value).map_err(ValidationError::new)
}

pub(crate) fn non_negative_cost(value: &Decimal) -> Result<(), ValidationError> {
    shared::validate_unit_cost(*value).map_err(ValidationError::new)
}
