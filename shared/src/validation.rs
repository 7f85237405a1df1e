//! Validation utilities for stock documents and number sequences

use rust_decimal::Decimal;

use crate::types::{MAX_QTY, MAX_UNIT_COST, QTY_SCALE};

// ============================================================================
// Number Sequence Validations
// ============================================================================

/// Longest zero-padded counter width accepted for a sequence
pub const MAX_SEQUENCE_LENGTH: i16 = 12;

/// Validate a sequence lookup code (lowercase kebab-case, e.g. `stock-transfer`)
pub fn validate_sequence_code(code: &str) -> Result<(), &'static str> {
    if code.is_empty() || code.len() > 50 {
        return Err("Sequence code must be between 1 and 50 characters");
    }
    if code.starts_with('-') || code.ends_with('-') {
        return Err("Sequence code cannot start or end with a hyphen");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Sequence code must be lowercase alphanumeric with hyphens");
    }
    Ok(())
}

/// A format without `{seq}` would mint the same code forever
pub fn validate_sequence_format(format: &str) -> Result<(), &'static str> {
    if !format.contains("{seq}") {
        return Err("Format must contain the {seq} token");
    }
    Ok(())
}

pub fn validate_sequence_length(length: i16) -> Result<(), &'static str> {
    if !(1..=MAX_SEQUENCE_LENGTH).contains(&length) {
        return Err("Sequence length must be between 1 and 12");
    }
    Ok(())
}

// ============================================================================
// Stock Document Validations
// ============================================================================

/// Validate a line quantity: positive, at most four fractional digits
pub fn validate_quantity(qty: Decimal) -> Result<(), &'static str> {
    if qty <= Decimal::ZERO {
        return Err("Quantity must be greater than zero");
    }
    if qty.normalize().scale() > QTY_SCALE {
        return Err("Quantity supports at most 4 decimal places");
    }
    if qty > MAX_QTY {
        return Err("Quantity exceeds 9999999999.9999");
    }
    Ok(())
}

pub fn validate_unit_cost(cost: Decimal) -> Result<(), &'static str> {
    if cost < Decimal::ZERO {
        return Err("Unit cost cannot be negative");
    }
    if cost > MAX_UNIT_COST {
        return Err("Unit cost exceeds 999999999999.9999");
    }
    Ok(())
}

/// Source and destination of a transfer must differ
pub fn validate_transfer_warehouses(from: i64, to: i64) -> Result<(), &'static str> {
    if from == to {
        return Err("Destination warehouse must differ from source warehouse");
    }
    Ok(())
}

pub fn validate_has_details(count: usize) -> Result<(), &'static str> {
    if count == 0 {
        return Err("Document must have at least one detail line");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_sequence_code() {
        assert!(validate_sequence_code("stock-transfer").is_ok());
        assert!(validate_sequence_code("coa").is_ok());
        assert!(validate_sequence_code("").is_err());
        assert!(validate_sequence_code("Stock_Transfer").is_err());
        assert!(validate_sequence_code("-po").is_err());
    }

    #[test]
    fn test_validate_sequence_format() {
        assert!(validate_sequence_format("{prefix}-{seq}").is_ok());
        assert!(validate_sequence_format("{prefix}-{YYYY}").is_err());
    }

    #[test]
    fn test_validate_sequence_length_bounds() {
        assert!(validate_sequence_length(0).is_err());
        assert!(validate_sequence_length(1).is_ok());
        assert!(validate_sequence_length(12).is_ok());
        assert!(validate_sequence_length(13).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(Decimal::from_str("0.0001").unwrap()).is_ok());
        assert!(validate_quantity(Decimal::from_str("2.50000").unwrap()).is_ok());
        assert!(validate_quantity(Decimal::ZERO).is_err());
        assert!(validate_quantity(Decimal::from(-1)).is_err());
        assert!(validate_quantity(Decimal::from_str("0.00001").unwrap()).is_err());
    }

    #[test]
    fn test_amounts_bounded_by_column_size() {
        assert_eq!(MAX_QTY, Decimal::from_str("9999999999.9999").unwrap());
        assert_eq!(MAX_UNIT_COST, Decimal::from_str("999999999999.9999").unwrap());

        assert!(validate_quantity(MAX_QTY).is_ok());
        assert!(validate_quantity(Decimal::from(10_000_000_000i64)).is_err());
        assert!(validate_quantity(Decimal::from(1_000_000_000_000_000i64)).is_err());

        assert!(validate_unit_cost(MAX_UNIT_COST).is_ok());
        assert!(validate_unit_cost(Decimal::from(1_000_000_000_000i64)).is_err());
        assert!(validate_unit_cost(Decimal::from(1_000_000_000_000_000i64)).is_err());
    }

    #[test]
    fn test_validate_transfer_warehouses() {
        assert!(validate_transfer_warehouses(1, 2).is_ok());
        assert!(validate_transfer_warehouses(3, 3).is_err());
    }

    #[test]
    fn test_validate_has_details() {
        assert!(validate_has_details(0).is_err());
        assert!(validate_has_details(2).is_ok());
    }

    proptest! {
        #[test]
        fn prop_positive_four_digit_quantities_are_valid(units in 1i64..1_000_000_000i64) {
            let qty = Decimal::new(units, QTY_SCALE);
            prop_assert!(validate_quantity(qty).is_ok());
        }

        #[test]
        fn prop_unit_cost_sign(units in -1_000_000i64..1_000_000i64) {
            let cost = Decimal::new(units, 2);
            prop_assert_eq!(validate_unit_cost(cost).is_ok(), units >= 0);
        }
    }
}
