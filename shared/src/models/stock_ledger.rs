//! Stock ledger models and balance arithmetic
//!
//! The ledger is an append-only list of movements. Running balances are kept
//! per lane, where a lane is `(product, warehouse, batch)`; a missing batch
//! is its own lane, distinct from every named batch.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::ParseEnumError;
use crate::types::round_qty;

/// Suffix appended to a reference type on compensating entries
pub const REVERSAL_SUFFIX: &str = "/Reversal";

/// Document kinds that post to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocumentKind {
    StockAdjustment,
    StockTransfer,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::StockAdjustment => "StockAdjustment",
            DocumentKind::StockTransfer => "StockTransfer",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "StockAdjustment" => Ok(DocumentKind::StockAdjustment),
            "StockTransfer" => Ok(DocumentKind::StockTransfer),
            other => Err(ParseEnumError::new("document kind", other)),
        }
    }
}

/// Link from a ledger row to the document that produced it.
///
/// Serialized as `{ "ref_type": "StockTransfer/Reversal", "ref_id": 1 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "LedgerRefRepr", try_from = "LedgerRefRepr")]
pub struct LedgerRef {
    pub kind: DocumentKind,
    pub id: i64,
    /// Compensating rows appended by a reversal
    pub reversal: bool,
}

impl LedgerRef {
    pub fn new(kind: DocumentKind, id: i64) -> Self {
        Self {
            kind,
            id,
            reversal: false,
        }
    }

    pub fn adjustment(id: i64) -> Self {
        Self::new(DocumentKind::StockAdjustment, id)
    }

    pub fn transfer(id: i64) -> Self {
        Self::new(DocumentKind::StockTransfer, id)
    }

    /// The reference carried by compensating rows of this document
    pub fn as_reversal(&self) -> Self {
        Self {
            reversal: true,
            ..*self
        }
    }

    /// Reference type as shown to users, e.g. `StockTransfer/Reversal`
    pub fn ref_type(&self) -> String {
        if self.reversal {
            format!("{}{}", self.kind.as_str(), REVERSAL_SUFFIX)
        } else {
            self.kind.as_str().to_string()
        }
    }

    /// Parse a user-facing reference type plus id
    pub fn parse(ref_type: &str, id: i64) -> Result<Self, ParseEnumError> {
        let (kind, reversal) = match ref_type.strip_suffix(REVERSAL_SUFFIX) {
            Some(kind) => (kind, true),
            None => (ref_type, false),
        };
        Ok(Self {
            kind: kind.parse()?,
            id,
            reversal,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct LedgerRefRepr {
    ref_type: String,
    ref_id: i64,
}

impl From<LedgerRef> for LedgerRefRepr {
    fn from(r: LedgerRef) -> Self {
        Self {
            ref_type: r.ref_type(),
            ref_id: r.id,
        }
    }
}

impl TryFrom<LedgerRefRepr> for LedgerRef {
    type Error = ParseEnumError;

    fn try_from(repr: LedgerRefRepr) -> Result<Self, Self::Error> {
        LedgerRef::parse(&repr.ref_type, repr.ref_id)
    }
}

/// `(product, warehouse, batch)` key of an independent running balance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LaneKey {
    pub product_id: i64,
    pub warehouse_id: i64,
    pub batch_number: Option<String>,
}

impl LaneKey {
    /// Blank batch numbers collapse into the no-batch lane
    pub fn new(product_id: i64, warehouse_id: i64, batch_number: Option<&str>) -> Self {
        Self {
            product_id,
            warehouse_id,
            batch_number: normalize_batch(batch_number),
        }
    }

    /// Stable text key, used for advisory locking
    pub fn lock_key(&self) -> String {
        match &self.batch_number {
            Some(batch) => format!("lane:{}:{}:b:{}", self.product_id, self.warehouse_id, batch),
            None => format!("lane:{}:{}:-", self.product_id, self.warehouse_id),
        }
    }
}

impl fmt::Display for LaneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "product #{} in warehouse #{}", self.product_id, self.warehouse_id)?;
        if let Some(batch) = &self.batch_number {
            write!(f, " (batch: {})", batch)?;
        }
        Ok(())
    }
}

pub fn normalize_batch(batch_number: Option<&str>) -> Option<String> {
    batch_number
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
}

/// A movement to be recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub transaction_date: DateTime<Utc>,
    pub product_id: i64,
    pub warehouse_id: i64,
    pub branch_id: Option<i64>,
    pub reference: LedgerRef,
    /// Human-readable document code
    pub code: Option<String>,
    pub uom_id: i64,
    pub batch_number: Option<String>,
    pub qty_in: Decimal,
    pub qty_out: Decimal,
    pub unit_cost: Decimal,
    /// Entry this movement compensates, for reversal rows
    pub reversal_of: Option<i64>,
}

impl StockMovement {
    pub fn lane(&self) -> LaneKey {
        LaneKey::new(self.product_id, self.warehouse_id, self.batch_number.as_deref())
    }

    /// Mirror of `entry` with in/out swapped, dated `now`
    pub fn reversal_of(entry: &StockLedgerEntry, now: DateTime<Utc>) -> Self {
        Self {
            transaction_date: now,
            product_id: entry.product_id,
            warehouse_id: entry.warehouse_id,
            branch_id: entry.branch_id,
            reference: entry.reference.as_reversal(),
            code: entry.code.clone(),
            uom_id: entry.uom_id,
            batch_number: entry.batch_number.clone(),
            qty_in: entry.qty_out,
            qty_out: entry.qty_in,
            unit_cost: entry.unit_cost,
            reversal_of: Some(entry.id),
        }
    }
}

/// A recorded ledger row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLedgerEntry {
    pub id: i64,
    pub transaction_date: DateTime<Utc>,
    pub product_id: i64,
    pub warehouse_id: i64,
    pub branch_id: Option<i64>,
    #[serde(flatten)]
    pub reference: LedgerRef,
    pub code: Option<String>,
    pub uom_id: i64,
    pub batch_number: Option<String>,
    pub qty_in: Decimal,
    pub qty_out: Decimal,
    pub base_qty_in: Decimal,
    pub base_qty_out: Decimal,
    pub base_balance: Decimal,
    pub unit_cost: Decimal,
    pub total_value: Decimal,
    pub reversal_of: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl StockLedgerEntry {
    pub fn lane(&self) -> LaneKey {
        LaneKey::new(self.product_id, self.warehouse_id, self.batch_number.as_deref())
    }

    pub fn net_base_qty(&self) -> Decimal {
        self.base_qty_in - self.base_qty_out
    }
}

/// Base-unit amounts derived for one movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingAmounts {
    pub qty_in: Decimal,
    pub qty_out: Decimal,
    pub base_qty_in: Decimal,
    pub base_qty_out: Decimal,
    pub unit_cost: Decimal,
    pub total_value: Decimal,
}

/// A quantity or value that does not fit the decimal range
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{what} out of range: {lhs} x {rhs}")]
pub struct AmountOverflow {
    pub what: &'static str,
    pub lhs: Decimal,
    pub rhs: Decimal,
}

/// Convert transaction quantities to base units and value the inbound side
pub fn compute_posting(
    qty_in: Decimal,
    qty_out: Decimal,
    conversion: Decimal,
    unit_cost: Decimal,
) -> Result<PostingAmounts, AmountOverflow> {
    let qty_in = round_qty(qty_in);
    let qty_out = round_qty(qty_out);
    let base_qty_in = to_base_qty(qty_in, conversion)?;
    let base_qty_out = to_base_qty(qty_out, conversion)?;
    let unit_cost = round_qty(unit_cost);
    let total_value = base_qty_in.checked_mul(unit_cost).ok_or(AmountOverflow {
        what: "total value",
        lhs: base_qty_in,
        rhs: unit_cost,
    })?;

    Ok(PostingAmounts {
        qty_in,
        qty_out,
        base_qty_in,
        base_qty_out,
        unit_cost,
        total_value: round_qty(total_value),
    })
}

pub fn to_base_qty(qty: Decimal, conversion: Decimal) -> Result<Decimal, AmountOverflow> {
    qty.checked_mul(conversion)
        .map(round_qty)
        .ok_or(AmountOverflow {
            what: "base quantity",
            lhs: qty,
            rhs: conversion,
        })
}

/// `previous + in - out`
pub fn next_balance(previous: Decimal, base_qty_in: Decimal, base_qty_out: Decimal) -> Decimal {
    previous + base_qty_in - base_qty_out
}

/// Running balances for a lane's movements in insertion order
pub fn running_balances<I>(movements: I) -> Vec<Decimal>
where
    I: IntoIterator<Item = (Decimal, Decimal)>,
{
    let mut balance = Decimal::ZERO;
    movements
        .into_iter()
        .map(|(qty_in, qty_out)| {
            balance = next_balance(balance, qty_in, qty_out);
            balance
        })
        .collect()
}

/// Lowest running balance reached when replaying `movements` on top of
/// `opening`. Returns `opening` when there is nothing to replay.
pub fn min_running_balance<I>(opening: Decimal, movements: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, Decimal)>,
{
    let mut running = opening;
    let mut min: Option<Decimal> = None;

    for (qty_in, qty_out) in movements {
        running = next_balance(running, qty_in, qty_out);
        min = Some(min.map_or(running, |m| m.min(running)));
    }

    min.unwrap_or(opening)
}

/// Available quantity in one batch lane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchAvailability {
    pub batch_number: Option<String>,
    pub available_qty: Decimal,
}

/// Base quantity a document needs on one lane
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaneRequirement {
    pub lane: LaneKey,
    pub required: Decimal,
}

/// Sum required base quantities per lane, ordered by lane key.
///
/// The ordering doubles as the lock acquisition order.
pub fn aggregate_by_lane<I>(lines: I) -> Vec<LaneRequirement>
where
    I: IntoIterator<Item = (LaneKey, Decimal)>,
{
    let mut totals: BTreeMap<LaneKey, Decimal> = BTreeMap::new();
    for (lane, qty) in lines {
        *totals.entry(lane).or_insert(Decimal::ZERO) += qty;
    }
    totals
        .into_iter()
        .map(|(lane, required)| LaneRequirement { lane, required })
        .collect()
}

/// A lane that cannot cover a requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("insufficient stock for {lane}: available {available}, required {required}")]
pub struct StockShortfall {
    pub lane: LaneKey,
    pub available: Decimal,
    pub required: Decimal,
}

impl LaneRequirement {
    /// `Err` when `available` is below the requirement
    pub fn check(&self, available: Decimal) -> Result<(), StockShortfall> {
        if available < self.required {
            Err(StockShortfall {
                lane: self.lane.clone(),
                available,
                required: self.required,
            })
        } else {
            Ok(())
        }
    }
}
