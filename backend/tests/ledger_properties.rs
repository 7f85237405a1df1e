//! Properties of the pure inventory arithmetic
//!
//! Running balances, reversals, the min-balance walk, lane aggregation,
//! counter scopes and the stock transfer workflow.

use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use shared::models::{
    aggregate_by_lane, build_scope_key, compute_posting, min_running_balance, render_template,
    running_balances, DocumentKind, FormatTemplate, LaneKey, LedgerRef, ResetPolicy,
    StockLedgerEntry, StockMovement, TransferAction, TransferStatus,
};

// ============================================================================
// Strategies
// ============================================================================

/// Quantities with up to four decimal places
fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000).prop_map(|n| Decimal::new(n, 4))
}

/// One movement: either an inbound or an outbound quantity
fn movement_strategy() -> impl Strategy<Value = (Decimal, Decimal)> {
    (any::<bool>(), quantity_strategy()).prop_map(|(inbound, qty)| {
        if inbound {
            (qty, Decimal::ZERO)
        } else {
            (Decimal::ZERO, qty)
        }
    })
}

fn conversion_strategy() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        Just(Decimal::ONE),
        Just(Decimal::from(12)),
        Just(Decimal::new(5, 1)),
        Just(Decimal::new(25, 0)),
    ]
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2030, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn status_strategy() -> impl Strategy<Value = TransferStatus> {
    prop_oneof![Just(TransferStatus::Draft), Just(TransferStatus::Posted)]
}

fn action_strategy() -> impl Strategy<Value = TransferAction> {
    prop_oneof![
        Just(TransferAction::Update),
        Just(TransferAction::Delete),
        Just(TransferAction::Approve),
        Just(TransferAction::Disapprove),
    ]
}

fn entry(id: i64, qty_in: Decimal, qty_out: Decimal, factor: Decimal) -> StockLedgerEntry {
    let amounts = compute_posting(qty_in, qty_out, factor, Decimal::from(3)).unwrap();
    StockLedgerEntry {
        id,
        transaction_date: Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap(),
        product_id: 1,
        warehouse_id: 1,
        branch_id: None,
        reference: LedgerRef::new(DocumentKind::StockAdjustment, 9),
        code: Some("ADJ/2026/03/0001".to_string()),
        uom_id: 2,
        batch_number: None,
        qty_in: amounts.qty_in,
        qty_out: amounts.qty_out,
        base_qty_in: amounts.base_qty_in,
        base_qty_out: amounts.base_qty_out,
        base_balance: Decimal::ZERO,
        unit_cost: amounts.unit_cost,
        total_value: amounts.total_value,
        reversal_of: None,
        created_at: Utc::now(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn test_in_then_out_leaves_difference() {
    let balances = running_balances(vec![
        (Decimal::from(10), Decimal::ZERO),
        (Decimal::ZERO, Decimal::from(4)),
    ]);
    assert_eq!(balances, vec![Decimal::from(10), Decimal::from(6)]);
}

#[test]
fn test_consumed_receipt_min_balance() {
    // received 10 then 6 consumed: only 4 can still be retracted
    let min = min_running_balance(
        Decimal::ZERO,
        vec![
            (Decimal::from(10), Decimal::ZERO),
            (Decimal::ZERO, Decimal::from(6)),
        ],
    );
    assert_eq!(min, Decimal::from(4));
    assert!(min < Decimal::from(10));
}

#[test]
fn test_reversal_references_original() {
    let original = entry(41, Decimal::from(5), Decimal::ZERO, Decimal::from(12));
    let reversal = StockMovement::reversal_of(&original, Utc::now());
    assert_eq!(reversal.reversal_of, Some(41));
    assert_eq!(reversal.reference.ref_type(), "StockAdjustment/Reversal");
    assert_eq!(reversal.qty_out, Decimal::from(5));
    assert_eq!(reversal.qty_in, Decimal::ZERO);
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Each balance is the previous balance plus in minus out
    #[test]
    fn prop_running_balance_recurrence(
        movements in prop::collection::vec(movement_strategy(), 1..40)
    ) {
        let balances = running_balances(movements.clone());
        prop_assert_eq!(balances.len(), movements.len());

        let mut previous = Decimal::ZERO;
        for ((qty_in, qty_out), balance) in movements.iter().zip(&balances) {
            prop_assert_eq!(*balance, previous + qty_in - qty_out);
            previous = *balance;
        }

        let net: Decimal = movements.iter().map(|(i, o)| i - o).sum();
        prop_assert_eq!(balances.last().copied(), Some(net));
    }

    /// A reversed set of rows nets to zero in base units
    #[test]
    fn prop_reversal_nets_to_zero(
        movements in prop::collection::vec(movement_strategy(), 1..20),
        factor in conversion_strategy(),
    ) {
        let originals: Vec<StockLedgerEntry> = movements
            .iter()
            .enumerate()
            .map(|(i, (qty_in, qty_out))| entry(i as i64 + 1, *qty_in, *qty_out, factor))
            .collect();

        let now = Utc::now();
        let mut net = Decimal::ZERO;
        for original in &originals {
            let reversal = StockMovement::reversal_of(original, now);
            let amounts = compute_posting(reversal.qty_in, reversal.qty_out, factor, reversal.unit_cost).unwrap();
            net += original.net_base_qty();
            net += amounts.base_qty_in - amounts.base_qty_out;
        }
        prop_assert_eq!(net, Decimal::ZERO);
    }

    /// The min-balance walk returns the lowest running balance
    #[test]
    fn prop_min_balance_is_lowest_running_balance(
        opening in quantity_strategy(),
        movements in prop::collection::vec(movement_strategy(), 1..30),
    ) {
        let min = min_running_balance(opening, movements.clone());

        let mut running = opening;
        let mut lowest: Option<Decimal> = None;
        for (qty_in, qty_out) in &movements {
            running = running + qty_in - qty_out;
            prop_assert!(min <= running);
            lowest = Some(lowest.map_or(running, |l: Decimal| l.min(running)));
        }
        prop_assert_eq!(Some(min), lowest);
    }

    /// Aggregation keeps the total and yields one sorted entry per lane
    #[test]
    fn prop_aggregate_by_lane_preserves_totals(
        lines in prop::collection::vec((1i64..4, prop::option::of("[AB]"), quantity_strategy()), 1..20)
    ) {
        let requirements = aggregate_by_lane(
            lines.iter().map(|(product, batch, qty)| (LaneKey::new(*product, 7, batch.as_deref()), *qty)),
        );

        let total: Decimal = lines.iter().map(|(_, _, qty)| *qty).sum();
        let aggregated: Decimal = requirements.iter().map(|r| r.required).sum();
        prop_assert_eq!(total, aggregated);

        for pair in requirements.windows(2) {
            prop_assert!(pair[0].lane < pair[1].lane);
        }
    }

    /// Successive counter values render to distinct, ordered codes
    #[test]
    fn prop_counter_numbers_render_contiguously(
        start in 1i64..5_000,
        count in 1usize..50,
        date in date_strategy(),
    ) {
        let template = FormatTemplate {
            prefix: "CBG",
            separator: "-",
            format: "{prefix}-{seq}",
            sequence_length: 4,
        };
        let codes: Vec<String> = (start..start + count as i64)
            .map(|n| render_template(&template, n, None, date))
            .collect();

        for (offset, code) in codes.iter().enumerate() {
            let number: i64 = code.trim_start_matches("CBG-").parse().unwrap();
            prop_assert_eq!(number, start + offset as i64);
        }
    }

    /// Monthly scopes share a key within a month and split across months
    #[test]
    fn prop_monthly_scope_key_buckets(a in date_strategy(), b in date_strategy()) {
        let key_a = build_scope_key(ResetPolicy::Monthly, Some("BDG"), a);
        let key_b = build_scope_key(ResetPolicy::Monthly, Some("BDG"), b);
        let same_month = a.year() == b.year() && a.month() == b.month();
        prop_assert_eq!(key_a == key_b, same_month);

        let other_branch = build_scope_key(ResetPolicy::Monthly, Some("JKT"), a);
        prop_assert_ne!(key_a, other_branch);
    }

    /// Only the four draft/posted edges are allowed
    #[test]
    fn prop_transfer_transitions(status in status_strategy(), action in action_strategy()) {
        let allowed = matches!(
            (status, action),
            (TransferStatus::Draft, TransferAction::Update)
                | (TransferStatus::Draft, TransferAction::Delete)
                | (TransferStatus::Draft, TransferAction::Approve)
                | (TransferStatus::Posted, TransferAction::Disapprove)
        );
        prop_assert_eq!(status.apply(action).is_ok(), allowed);
    }
}
