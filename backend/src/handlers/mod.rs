//! HTTP request handlers

pub mod health;
pub mod number_sequence;
pub mod stock_adjustment;
pub mod stock_ledger;
pub mod stock_transfer;

pub use health::*;
pub use number_sequence::*;
pub use stock_adjustment::*;
pub use stock_ledger::*;
pub use stock_transfer::*;
