//! WebAssembly module for the ERP stock admin console
//!
//! Client-side previews that must agree with the server:
//! - Number sequence format previews and scope keys
//! - Base unit conversion
//! - Transfer code and workflow checks

use chrono::NaiveDate;
use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

use shared::models::{
    build_scope_key, is_placeholder_code, preview_format, to_base_qty, FormatTemplate, ResetPolicy,
    ScopeType, TransferAction, TransferStatus,
};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&JsValue::from_str("erp-stock wasm ready"));
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// `YYYY-MM-DD`, or today in the browser's clock when empty
fn parse_date(date: Option<String>) -> Result<NaiveDate, JsValue> {
    match date.filter(|d| !d.is_empty()) {
        Some(d) => NaiveDate::parse_from_str(&d, "%Y-%m-%d")
            .map_err(|e| JsValue::from_str(&format!("Invalid date '{}': {}", d, e))),
        None => {
            let now = js_sys::Date::new_0();
            NaiveDate::from_ymd_opt(
                now.get_full_year() as i32,
                now.get_month() + 1,
                now.get_date(),
            )
            .ok_or_else(|| JsValue::from_str("Invalid browser date"))
        }
    }
}

/// Render a sequence format with the sample number 1
#[wasm_bindgen]
pub fn preview_sequence_format(
    prefix: &str,
    separator: &str,
    format: &str,
    sequence_length: u32,
    scope_type: &str,
    branch_code: Option<String>,
    date: Option<String>,
) -> Result<String, JsValue> {
    shared::validate_sequence_format(format).map_err(js_error)?;
    shared::validate_sequence_length(i16::try_from(sequence_length).unwrap_or(i16::MAX))
        .map_err(js_error)?;
    let scope: ScopeType = scope_type.parse().map_err(js_error)?;

    let template = FormatTemplate {
        prefix,
        separator,
        format,
        sequence_length: sequence_length as usize,
    };
    Ok(preview_format(&template, scope, branch_code.as_deref(), parse_date(date)?))
}

/// Counter scope a code would be drawn from
#[wasm_bindgen]
pub fn sequence_scope_key(
    reset_type: &str,
    branch_code: Option<String>,
    date: Option<String>,
) -> Result<String, JsValue> {
    let reset: ResetPolicy = reset_type.parse().map_err(js_error)?;
    Ok(build_scope_key(reset, branch_code.as_deref(), parse_date(date)?))
}

/// Base quantity of `qty` units, as a decimal string
#[wasm_bindgen]
pub fn to_base_quantity(qty: &str, conversion_factor: &str) -> Result<String, JsValue> {
    let qty: Decimal = qty.trim().parse().map_err(js_error)?;
    let factor: Decimal = conversion_factor.trim().parse().map_err(js_error)?;
    if factor <= Decimal::ZERO {
        return Err(JsValue::from_str("Conversion factor must be positive"));
    }
    Ok(to_base_qty(qty, factor).map_err(js_error)?.to_string())
}

/// Whether a transfer still carries a placeholder code
#[wasm_bindgen]
pub fn is_placeholder_transfer_code(code: &str) -> bool {
    is_placeholder_code(code)
}

/// Status a transfer ends up in after `action`, for enabling buttons
#[wasm_bindgen]
pub fn transfer_status_after(status: &str, action: &str) -> Result<String, JsValue> {
    let status: TransferStatus = status.parse().map_err(js_error)?;
    let action: TransferAction = action.parse().map_err(js_error)?;
    status
        .apply(action)
        .map(|next| next.as_str().to_string())
        .map_err(js_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_preview_branch_format() {
        let preview = preview_sequence_format(
            "TRF",
            "/",
            "{prefix}{sep}{branch}{sep}{YYYY}{sep}{MM}{sep}{seq}",
            4,
            "branch",
            Some("BDG".to_string()),
            day("2026-03-15"),
        )
        .unwrap();
        assert_eq!(preview, "TRF/BDG/2026/03/0001");
    }

    #[test]
    fn test_preview_global_ignores_branch() {
        let preview =
            preview_sequence_format("CBG", "-", "{prefix}-{seq}", 4, "global", day("BDG"), day("2026-01-01"))
                .unwrap();
        assert_eq!(preview, "CBG-0001");
    }

    #[test]
    fn test_scope_key_monthly() {
        let a = sequence_scope_key("monthly", day("BDG"), day("2026-03-01")).unwrap();
        let b = sequence_scope_key("monthly", day("BDG"), day("2026-03-31")).unwrap();
        assert_eq!(a, b);
        assert_eq!(sequence_scope_key("none", None, day("2026-03-01")).unwrap(), "global");
    }

    #[test]
    fn test_to_base_quantity() {
        let base: Decimal = to_base_quantity("2.5", "12").unwrap().parse().unwrap();
        assert_eq!(base, Decimal::from(30));
    }

    #[test]
    fn test_placeholder_codes() {
        assert!(is_placeholder_transfer_code("DRAFT-1f2e"));
        assert!(is_placeholder_transfer_code("AUTOCODE/TRF"));
        assert!(!is_placeholder_transfer_code("TRF/BDG/2026/03/0001"));
    }

    #[test]
    fn test_transfer_status_after() {
        assert_eq!(transfer_status_after("draft", "approve").unwrap(), "posted");
        assert_eq!(transfer_status_after("posted", "disapprove").unwrap(), "draft");
    }
}
