//! Common types used across the back office

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fractional digits kept on every stored quantity, cost and value
pub const QTY_SCALE: u32 = 4;

/// Largest quantity a `NUMERIC(14,4)` column holds
pub const MAX_QTY: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 4);

/// Largest unit cost a `NUMERIC(16,4)` column holds
pub const MAX_UNIT_COST: Decimal = Decimal::from_parts(1_874_919_423, 2_328_306, 0, false, 4);

/// Round a quantity to the stored fixed-point scale
pub fn round_qty(value: Decimal) -> Decimal {
    value.round_dp(QTY_SCALE)
}

/// Midnight UTC at the start of `date`
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Exclusive upper bound covering every instant of `date`
pub fn end_of_day_exclusive(date: NaiveDate) -> DateTime<Utc> {
    let start = start_of_day(date);
    start.checked_add_signed(Duration::days(1)).unwrap_or(start)
}

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl Pagination {
    pub const MAX_PER_PAGE: u32 = 100;

    /// Rows per page, clamped to `1..=MAX_PER_PAGE`
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page.clamp(1, Self::MAX_PER_PAGE))
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.max(1) - 1) * self.limit()
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, pagination: &Pagination, total_items: u64) -> Self {
        let per_page = pagination.limit() as u64;
        let total_pages = total_items.div_ceil(per_page) as u32;

        Self {
            data,
            pagination: PaginationMeta {
                page: pagination.page.max(1),
                per_page: per_page as u32,
                total_items,
                total_pages,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_round_qty_keeps_four_digits() {
        let value = Decimal::from_str("1.234567").unwrap();
        assert_eq!(round_qty(value), Decimal::from_str("1.2346").unwrap());
    }

    #[test]
    fn test_day_bounds() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let start = start_of_day(date);
        let end = end_of_day_exclusive(date);
        assert_eq!(start.to_rfc3339(), "2026-03-15T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-03-16T00:00:00+00:00");
    }

    #[test]
    fn test_pagination_offsets() {
        let p = Pagination { page: 3, per_page: 25 };
        assert_eq!(p.limit(), 25);
        assert_eq!(p.offset(), 50);

        let clamped = Pagination { page: 0, per_page: 1000 };
        assert_eq!(clamped.limit(), 100);
        assert_eq!(clamped.offset(), 0);
    }

    #[test]
    fn test_paginated_response_pages() {
        let p = Pagination { page: 1, per_page: 20 };
        let resp = PaginatedResponse::new(vec![1, 2, 3], &p, 41);
        assert_eq!(resp.pagination.total_pages, 3);
        assert_eq!(resp.pagination.total_items, 41);

        let empty: PaginatedResponse<i32> = PaginatedResponse::new(vec![], &p, 0);
        assert_eq!(empty.pagination.total_pages, 0);
    }
}
