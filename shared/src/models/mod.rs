//! Domain models for inventory stock accounting

mod activity;
mod number_sequence;
mod stock_adjustment;
mod stock_ledger;
mod stock_transfer;

pub use activity::*;
pub use number_sequence::*;
pub use stock_adjustment::*;
pub use stock_ledger::*;
pub use stock_transfer::*;

use thiserror::Error;

/// A stored or submitted enum value that is not recognised
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {what}: {value}")]
pub struct ParseEnumError {
    pub what: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_string(),
        }
    }
}
