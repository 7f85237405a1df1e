//! Stock ledger service
//!
//! Appends movements and maintains the running balance of each
//! `(product, warehouse, batch)` lane. Every write serializes on the lane
//! with a transaction-scoped advisory lock plus `FOR UPDATE` on the lane's
//! latest row, so concurrent postings on one lane never read the same
//! previous balance. Disjoint lanes proceed in parallel.
//!
//! The `*_in` functions run inside a caller-supplied transaction so document
//! services can compose guards and postings atomically.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};

use shared::models::{
    compute_posting, min_running_balance, next_balance, BatchAvailability, DocumentKind, LaneKey,
    LedgerRef, ParseEnumError, PostingAmounts, StockLedgerEntry, StockMovement,
};
use shared::types::{end_of_day_exclusive, round_qty};

use crate::error::{AppError, AppResult};
use crate::services::ProductUnitLookup;

const LEDGER_COLUMNS: &str = "id, transaction_date, product_id, warehouse_id, branch_id, \
     ref_type, ref_id, code, uom_id, batch_number, qty_in, qty_out, base_qty_in, base_qty_out, \
     base_balance, unit_cost, total_value, reversal_of, created_at";

/// Lane predicate on `$1, $2, $3`; a NULL batch only matches NULL
const LANE_FILTER: &str =
    "product_id = $1 AND warehouse_id = $2 AND batch_number IS NOT DISTINCT FROM $3";

/// Stock ledger service
#[derive(Clone)]
pub struct StockLedgerService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct LedgerRow {
    id: i64,
    transaction_date: DateTime<Utc>,
    product_id: i64,
    warehouse_id: i64,
    branch_id: Option<i64>,
    ref_type: String,
    ref_id: i64,
    code: Option<String>,
    uom_id: i64,
    batch_number: Option<String>,
    qty_in: Decimal,
    qty_out: Decimal,
    base_qty_in: Decimal,
    base_qty_out: Decimal,
    base_balance: Decimal,
    unit_cost: Decimal,
    total_value: Decimal,
    reversal_of: Option<i64>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LedgerRow> for StockLedgerEntry {
    type Error = ParseEnumError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        Ok(StockLedgerEntry {
            id: row.id,
            transaction_date: row.transaction_date,
            product_id: row.product_id,
            warehouse_id: row.warehouse_id,
            branch_id: row.branch_id,
            reference: LedgerRef::parse(&row.ref_type, row.ref_id)?,
            code: row.code,
            uom_id: row.uom_id,
            batch_number: row.batch_number,
            qty_in: row.qty_in,
            qty_out: row.qty_out,
            base_qty_in: row.base_qty_in,
            base_qty_out: row.base_qty_out,
            base_balance: row.base_balance,
            unit_cost: row.unit_cost,
            total_value: row.total_value,
            reversal_of: row.reversal_of,
            created_at: row.created_at,
        })
    }
}

fn into_entries(rows: Vec<LedgerRow>) -> AppResult<Vec<StockLedgerEntry>> {
    rows.into_iter()
        .map(|row| StockLedgerEntry::try_from(row).map_err(AppError::from))
        .collect()
}

#[derive(Debug, FromRow)]
struct LaneRow {
    product_id: i64,
    warehouse_id: i64,
    batch_number: Option<String>,
}

impl StockLedgerService {
    /// Create a new StockLedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record one movement in its own transaction
    pub async fn record(&self, movement: StockMovement) -> AppResult<StockLedgerEntry> {
        let mut tx = self.db.begin().await?;
        let entry = Self::record_in(&mut tx, movement).await?;
        tx.commit().await?;
        Ok(entry)
    }

    /// Record several movements atomically; all succeed or none do
    pub async fn record_batch(
        &self,
        movements: Vec<StockMovement>,
    ) -> AppResult<Vec<StockLedgerEntry>> {
        let mut tx = self.db.begin().await?;
        let entries = Self::record_batch_in(&mut tx, movements).await?;
        tx.commit().await?;
        Ok(entries)
    }

    /// Hard-delete every row of `reference`; a second call is a no-op
    pub async fn delete_by_ref(&self, reference: LedgerRef) -> AppResult<u64> {
        let mut tx = self.db.begin().await?;
        let deleted = Self::delete_by_ref_in(&mut tx, reference).await?;
        tx.commit().await?;
        Ok(deleted)
    }

    /// Append compensating rows for every not yet reversed row of `reference`
    pub async fn reverse(&self, reference: LedgerRef) -> AppResult<Vec<StockLedgerEntry>> {
        let mut tx = self.db.begin().await?;
        let entries = Self::reverse_in(&mut tx, reference, Utc::now()).await?;
        tx.commit().await?;
        Ok(entries)
    }

    /// Net base quantity of a lane up to the end of `as_of`
    pub async fn check_available_qty(&self, lane: &LaneKey, as_of: NaiveDate) -> AppResult<Decimal> {
        let mut conn = self.db.acquire().await?;
        Self::available_qty_in(&mut conn, lane, as_of).await
    }

    /// Lowest balance the lane reaches from `from` onwards
    pub async fn check_min_balance_from_date(
        &self,
        lane: &LaneKey,
        from: DateTime<Utc>,
    ) -> AppResult<Decimal> {
        let mut conn = self.db.acquire().await?;
        Self::min_balance_from_in(&mut conn, lane, from).await
    }

    /// Batches of a product in a warehouse with positive stock
    pub async fn available_batches(
        &self,
        product_id: i64,
        warehouse_id: i64,
    ) -> AppResult<Vec<BatchAvailability>> {
        let rows = sqlx::query_as::<_, (Option<String>, Decimal)>(
            r#"
            SELECT batch_number, SUM(base_qty_in - base_qty_out) AS available_qty
            FROM stock_ledgers
            WHERE product_id = $1 AND warehouse_id = $2
            GROUP BY batch_number
            HAVING SUM(base_qty_in - base_qty_out) > 0
            ORDER BY batch_number NULLS FIRST
            "#,
        )
        .bind(product_id)
        .bind(warehouse_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(batch_number, available_qty)| BatchAvailability {
                batch_number,
                available_qty,
            })
            .collect())
    }

    /// Original and compensating rows of a document, in insertion order
    pub async fn entries_by_ref(
        &self,
        kind: DocumentKind,
        ref_id: i64,
    ) -> AppResult<Vec<StockLedgerEntry>> {
        let original = LedgerRef::new(kind, ref_id);
        let rows = sqlx::query_as::<_, LedgerRow>(&format!(
            "SELECT {} FROM stock_ledgers WHERE ref_id = $1 AND ref_type IN ($2, $3) ORDER BY id",
            LEDGER_COLUMNS
        ))
        .bind(ref_id)
        .bind(original.ref_type())
        .bind(original.as_reversal().ref_type())
        .fetch_all(&self.db)
        .await?;

        into_entries(rows)
    }

    /// Full history of a lane in insertion order
    pub async fn lane_history(&self, lane: &LaneKey) -> AppResult<Vec<StockLedgerEntry>> {
        let rows = sqlx::query_as::<_, LedgerRow>(&format!(
            "SELECT {} FROM stock_ledgers WHERE {} ORDER BY id",
            LEDGER_COLUMNS, LANE_FILTER
        ))
        .bind(lane.product_id)
        .bind(lane.warehouse_id)
        .bind(&lane.batch_number)
        .fetch_all(&self.db)
        .await?;

        into_entries(rows)
    }

    // ------------------------------------------------------------------
    // Transaction-scoped primitives
    // ------------------------------------------------------------------

    /// Take the advisory locks of `lanes` in a stable order
    pub async fn lock_lanes<'a, I>(conn: &mut PgConnection, lanes: I) -> AppResult<()>
    where
        I: IntoIterator<Item = &'a LaneKey>,
    {
        let mut keys: Vec<String> = lanes.into_iter().map(LaneKey::lock_key).collect();
        keys.sort();
        keys.dedup();

        for key in keys {
            sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
                .bind(&key)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    pub async fn record_in(
        conn: &mut PgConnection,
        movement: StockMovement,
    ) -> AppResult<StockLedgerEntry> {
        validate_movement(&movement)?;

        let factor =
            ProductUnitLookup::conversion_factor(conn, movement.product_id, movement.uom_id).await?;
        let amounts =
            compute_posting(movement.qty_in, movement.qty_out, factor, movement.unit_cost)?;

        Self::insert_entry(conn, &movement, amounts).await
    }

    pub async fn record_batch_in(
        conn: &mut PgConnection,
        movements: Vec<StockMovement>,
    ) -> AppResult<Vec<StockLedgerEntry>> {
        let lanes: Vec<LaneKey> = movements.iter().map(StockMovement::lane).collect();
        Self::lock_lanes(conn, &lanes).await?;

        let mut entries = Vec::with_capacity(movements.len());
        for movement in movements {
            entries.push(Self::record_in(conn, movement).await?);
        }
        Ok(entries)
    }

    pub async fn delete_by_ref_in(conn: &mut PgConnection, reference: LedgerRef) -> AppResult<u64> {
        let lanes: Vec<LaneKey> = sqlx::query_as::<_, LaneRow>(
            r#"
            SELECT DISTINCT product_id, warehouse_id, batch_number
            FROM stock_ledgers
            WHERE ref_type = $1 AND ref_id = $2
            "#,
        )
        .bind(reference.ref_type())
        .bind(reference.id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|row| LaneKey::new(row.product_id, row.warehouse_id, row.batch_number.as_deref()))
        .collect();

        if lanes.is_empty() {
            return Ok(0);
        }

        Self::lock_lanes(conn, &lanes).await?;

        let deleted = sqlx::query("DELETE FROM stock_ledgers WHERE ref_type = $1 AND ref_id = $2")
            .bind(reference.ref_type())
            .bind(reference.id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        for lane in &lanes {
            Self::rebalance_lane(conn, lane).await?;
        }

        tracing::info!(
            ref_type = %reference.ref_type(),
            ref_id = reference.id,
            deleted,
            lanes = lanes.len(),
            "deleted ledger entries by reference"
        );
        Ok(deleted)
    }

    pub async fn reverse_in(
        conn: &mut PgConnection,
        reference: LedgerRef,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<StockLedgerEntry>> {
        // Lane locks come before row locks, the same order `insert_entry` uses
        let lanes: Vec<LaneKey> = sqlx::query_as::<_, LaneRow>(
            r#"
            SELECT DISTINCT product_id, warehouse_id, batch_number
            FROM stock_ledgers l
            WHERE l.ref_type = $1 AND l.ref_id = $2
              AND NOT EXISTS (SELECT 1 FROM stock_ledgers r WHERE r.reversal_of = l.id)
            "#,
        )
        .bind(reference.ref_type())
        .bind(reference.id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|row| LaneKey::new(row.product_id, row.warehouse_id, row.batch_number.as_deref()))
        .collect();

        if lanes.is_empty() {
            return Ok(Vec::new());
        }

        Self::lock_lanes(conn, &lanes).await?;

        let rows = sqlx::query_as::<_, LedgerRow>(&format!(
            r#"
            SELECT {} FROM stock_ledgers l
            WHERE l.ref_type = $1 AND l.ref_id = $2
              AND NOT EXISTS (SELECT 1 FROM stock_ledgers r WHERE r.reversal_of = l.id)
            ORDER BY l.id
            FOR UPDATE OF l
            "#,
            LEDGER_COLUMNS
        ))
        .bind(reference.ref_type())
        .bind(reference.id)
        .fetch_all(&mut *conn)
        .await?;
        let originals = into_entries(rows)?;

        let mut reversals = Vec::with_capacity(originals.len());
        for original in &originals {
            let movement = StockMovement::reversal_of(original, now);
            let amounts = mirrored_amounts(original);
            reversals.push(Self::insert_entry(conn, &movement, amounts).await?);
        }

        tracing::info!(
            ref_type = %reference.ref_type(),
            ref_id = reference.id,
            reversed = reversals.len(),
            "reversed ledger entries"
        );
        Ok(reversals)
    }

    pub async fn available_qty_in(
        conn: &mut PgConnection,
        lane: &LaneKey,
        as_of: NaiveDate,
    ) -> AppResult<Decimal> {
        let available = sqlx::query_scalar::<_, Decimal>(&format!(
            "SELECT COALESCE(SUM(base_qty_in - base_qty_out), 0) FROM stock_ledgers \
             WHERE {} AND transaction_date < $4",
            LANE_FILTER
        ))
        .bind(lane.product_id)
        .bind(lane.warehouse_id)
        .bind(&lane.batch_number)
        .bind(end_of_day_exclusive(as_of))
        .fetch_one(&mut *conn)
        .await?;

        Ok(available)
    }

    pub async fn min_balance_from_in(
        conn: &mut PgConnection,
        lane: &LaneKey,
        from: DateTime<Utc>,
    ) -> AppResult<Decimal> {
        let opening = sqlx::query_scalar::<_, Decimal>(&format!(
            "SELECT COALESCE(SUM(base_qty_in - base_qty_out), 0) FROM stock_ledgers \
             WHERE {} AND transaction_date < $4",
            LANE_FILTER
        ))
        .bind(lane.product_id)
        .bind(lane.warehouse_id)
        .bind(&lane.batch_number)
        .bind(from)
        .fetch_one(&mut *conn)
        .await?;

        let movements = sqlx::query_as::<_, (Decimal, Decimal)>(&format!(
            "SELECT base_qty_in, base_qty_out FROM stock_ledgers \
             WHERE {} AND transaction_date >= $4 ORDER BY transaction_date, id",
            LANE_FILTER
        ))
        .bind(lane.product_id)
        .bind(lane.warehouse_id)
        .bind(&lane.batch_number)
        .bind(from)
        .fetch_all(&mut *conn)
        .await?;

        Ok(min_running_balance(opening, movements))
    }

    /// Insert a row on top of the lane's latest balance
    async fn insert_entry(
        conn: &mut PgConnection,
        movement: &StockMovement,
        amounts: PostingAmounts,
    ) -> AppResult<StockLedgerEntry> {
        let lane = movement.lane();
        Self::lock_lanes(conn, [&lane]).await?;

        let previous = sqlx::query_scalar::<_, Decimal>(&format!(
            "SELECT base_balance FROM stock_ledgers WHERE {} ORDER BY id DESC LIMIT 1 FOR UPDATE",
            LANE_FILTER
        ))
        .bind(lane.product_id)
        .bind(lane.warehouse_id)
        .bind(&lane.batch_number)
        .fetch_optional(&mut *conn)
        .await?
        .unwrap_or(Decimal::ZERO);

        let balance = next_balance(previous, amounts.base_qty_in, amounts.base_qty_out);

        let row = sqlx::query_as::<_, LedgerRow>(&format!(
            r#"
            INSERT INTO stock_ledgers (
                transaction_date, product_id, warehouse_id, branch_id, ref_type, ref_id, code,
                uom_id, batch_number, qty_in, qty_out, base_qty_in, base_qty_out, base_balance,
                unit_cost, total_value, reversal_of
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {}
            "#,
            LEDGER_COLUMNS
        ))
        .bind(movement.transaction_date)
        .bind(movement.product_id)
        .bind(movement.warehouse_id)
        .bind(movement.branch_id)
        .bind(movement.reference.ref_type())
        .bind(movement.reference.id)
        .bind(&movement.code)
        .bind(movement.uom_id)
        .bind(&lane.batch_number)
        .bind(amounts.qty_in)
        .bind(amounts.qty_out)
        .bind(amounts.base_qty_in)
        .bind(amounts.base_qty_out)
        .bind(balance)
        .bind(amounts.unit_cost)
        .bind(amounts.total_value)
        .bind(movement.reversal_of)
        .fetch_one(&mut *conn)
        .await?;

        tracing::info!(
            entry_id = row.id,
            ref_type = %row.ref_type,
            ref_id = row.ref_id,
            lane = %lane,
            base_in = %amounts.base_qty_in,
            base_out = %amounts.base_qty_out,
            balance = %balance,
            "recorded stock movement"
        );

        StockLedgerEntry::try_from(row).map_err(AppError::from)
    }

    /// Re-thread stored balances after rows were removed from a lane
    async fn rebalance_lane(conn: &mut PgConnection, lane: &LaneKey) -> AppResult<()> {
        sqlx::query(&format!(
            r#"
            UPDATE stock_ledgers s
            SET base_balance = r.running
            FROM (
                SELECT id, SUM(base_qty_in - base_qty_out) OVER (ORDER BY id) AS running
                FROM stock_ledgers
                WHERE {}
            ) r
            WHERE s.id = r.id AND s.base_balance <> r.running
            "#,
            LANE_FILTER
        ))
        .bind(lane.product_id)
        .bind(lane.warehouse_id)
        .bind(&lane.batch_number)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

fn validate_movement(movement: &StockMovement) -> AppResult<()> {
    if movement.qty_in < Decimal::ZERO || movement.qty_out < Decimal::ZERO {
        return Err(AppError::validation("qty", "Movement quantities cannot be negative"));
    }
    if movement.qty_in.is_zero() && movement.qty_out.is_zero() {
        return Err(AppError::validation("qty", "Movement must have a quantity in or out"));
    }
    if movement.unit_cost < Decimal::ZERO {
        return Err(AppError::validation("unit_cost", "Unit cost cannot be negative"));
    }
    Ok(())
}

/// Amounts of the compensating row: base quantities mirror the original
/// exactly so the pair nets to zero whatever the current unit conversion.
fn mirrored_amounts(original: &StockLedgerEntry) -> PostingAmounts {
    PostingAmounts {
        qty_in: original.qty_out,
        qty_out: original.qty_in,
        base_qty_in: original.base_qty_out,
        base_qty_out: original.base_qty_in,
        unit_cost: original.unit_cost,
        total_value: round_qty(original.base_qty_out * original.unit_cost),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(qty_in: i64, qty_out: i64) -> StockLedgerEntry {
        let when = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        StockLedgerEntry {
            id: 1,
            transaction_date: when,
            product_id: 1,
            warehouse_id: 1,
            branch_id: None,
            reference: LedgerRef::adjustment(1),
            code: None,
            uom_id: 2,
            batch_number: None,
            qty_in: Decimal::from(qty_in),
            qty_out: Decimal::from(qty_out),
            base_qty_in: Decimal::from(qty_in * 12),
            base_qty_out: Decimal::from(qty_out * 12),
            base_balance: Decimal::ZERO,
            unit_cost: Decimal::from(3),
            total_value: Decimal::ZERO,
            reversal_of: None,
            created_at: when,
        }
    }

    #[test]
    fn test_mirrored_amounts_net_to_zero() {
        let original = entry(2, 0);
        let mirror = mirrored_amounts(&original);
        assert_eq!(mirror.base_qty_out, original.base_qty_in);
        assert_eq!(mirror.base_qty_in, Decimal::ZERO);
        assert_eq!(
            original.net_base_qty() + (mirror.base_qty_in - mirror.base_qty_out),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_mirrored_outbound_is_valued() {
        let mirror = mirrored_amounts(&entry(0, 1));
        assert_eq!(mirror.base_qty_in, Decimal::from(12));
        assert_eq!(mirror.total_value, Decimal::from(36));
    }

    #[test]
    fn test_validate_movement_rejects_empty() {
        let mut movement = StockMovement::reversal_of(&entry(1, 0), Utc::now());
        assert!(validate_movement(&movement).is_ok());
        movement.qty_out = Decimal::ZERO;
        assert!(validate_movement(&movement).is_err());
        movement.qty_in = Decimal::from(-1);
        assert!(validate_movement(&movement).is_err());
    }
}
