//! Shared types and models for the ERP stock back office
//!
//! This crate holds the pure inventory domain: number-sequence formatting,
//! ledger arithmetic, document models and validation. It is used by the
//! backend and compiled to WASM for the admin console.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
