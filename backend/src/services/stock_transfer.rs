//! Stock transfer service
//!
//! Transfers are drafted freely and only touch the ledger on approval,
//! which posts one OUT row at the source and one IN row at the destination
//! per line. Approval and disapproval lock the transfer row and every
//! affected lane before their guards run, so the checks and the writes see
//! the same ledger state.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::models::{
    aggregate_by_lane, detail_diff, placeholder_code, ActivityEvent, DetailSnapshot, DocumentKind,
    DomainEvent, LaneKey, LaneRequirement, LedgerRef, StockMovement, StockTransfer,
    StockTransferDetail, TransferAction, TransferStatus,
};
use shared::types::{start_of_day, PaginatedResponse, Pagination};

use crate::error::{AppError, AppResult};
use crate::services::{
    non_negative_cost, positive_quantity, ActivityLogService, Actor, NumberSequenceService,
    ProductUnitLookup, StockLedgerService,
};

/// Stock transfer service
#[derive(Clone)]
pub struct StockTransferService {
    db: PgPool,
    sequence_code: String,
}

/// Header and lines of a transfer, used for both create and update
#[derive(Debug, Deserialize, Validate)]
pub struct TransferInput {
    /// Leave empty to receive a placeholder until approval
    #[validate(length(min = 1, max = 100))]
    pub code: Option<String>,
    pub date: NaiveDate,
    pub from_warehouse_id: i64,
    pub to_warehouse_id: i64,
    pub branch_id: Option<i64>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate]
    pub details: Vec<TransferDetailInput>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TransferDetailInput {
    pub product_id: i64,
    #[validate(length(max = 100))]
    pub batch_number: Option<String>,
    pub unit_id: i64,
    #[validate(custom = "positive_quantity")]
    pub qty: Decimal,
    #[validate(custom = "non_negative_cost")]
    pub unit_cost: Option<Decimal>,
    #[validate(length(max = 255))]
    pub description: Option<String>,
}

impl TransferDetailInput {
    fn snapshot(&self) -> DetailSnapshot {
        DetailSnapshot {
            product_id: self.product_id,
            qty: self.qty,
            unit_id: self.unit_id,
            batch: shared::normalize_batch(self.batch_number.as_deref()),
        }
    }
}

/// List filters
#[derive(Debug, Default, Deserialize)]
pub struct TransferFilter {
    pub status: Option<TransferStatus>,
    pub warehouse_id: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl TransferFilter {
    pub fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

#[derive(Debug, FromRow)]
struct TransferRow {
    id: i64,
    uuid: Uuid,
    code: String,
    date: NaiveDate,
    from_warehouse_id: i64,
    to_warehouse_id: i64,
    description: Option<String>,
    status: String,
    branch_id: Option<i64>,
    approved_by: Option<Uuid>,
    approved_at: Option<DateTime<Utc>>,
    created_by: Option<Uuid>,
    updated_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransferRow {
    fn into_model(self, details: Vec<StockTransferDetail>) -> AppResult<StockTransfer> {
        Ok(StockTransfer {
            id: self.id,
            uuid: self.uuid,
            code: self.code,
            date: self.date,
            from_warehouse_id: self.from_warehouse_id,
            to_warehouse_id: self.to_warehouse_id,
            description: self.description,
            status: self.status.parse()?,
            branch_id: self.branch_id,
            approved_by: self.approved_by,
            approved_at: self.approved_at,
            details,
            created_by: self.created_by,
            updated_by: self.updated_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct TransferDetailRow {
    id: i64,
    product_id: i64,
    batch_number: Option<String>,
    unit_id: i64,
    qty: Decimal,
    unit_cost: Decimal,
    description: Option<String>,
}

impl From<TransferDetailRow> for StockTransferDetail {
    fn from(row: TransferDetailRow) -> Self {
        StockTransferDetail {
            id: row.id,
            product_id: row.product_id,
            batch_number: row.batch_number,
            unit_id: row.unit_id,
            qty: row.qty,
            unit_cost: row.unit_cost,
            description: row.description,
        }
    }
}

const TRANSFER_COLUMNS: &str = "id, uuid, code, date, from_warehouse_id, to_warehouse_id, \
     description, status, branch_id, approved_by, approved_at, created_by, updated_by, \
     created_at, updated_at";

/// A transfer line with its quantity in base units
#[derive(Debug, Clone)]
struct BaseLine {
    product_id: i64,
    batch_number: Option<String>,
    base_qty: Decimal,
}

/// Base quantities required per lane of `warehouse_id`
fn lane_requirements(lines: &[BaseLine], warehouse_id: i64) -> Vec<LaneRequirement> {
    aggregate_by_lane(lines.iter().map(|l| {
        (
            LaneKey::new(l.product_id, warehouse_id, l.batch_number.as_deref()),
            l.base_qty,
        )
    }))
}

/// Every lane a posted transfer touches, on both sides
fn transfer_lanes(transfer: &StockTransfer) -> Vec<LaneKey> {
    transfer
        .details
        .iter()
        .flat_map(|d| {
            [
                LaneKey::new(d.product_id, transfer.from_warehouse_id, d.batch_number.as_deref()),
                LaneKey::new(d.product_id, transfer.to_warehouse_id, d.batch_number.as_deref()),
            ]
        })
        .collect()
}

/// Paired OUT (source) and IN (destination) movements for every line
fn transfer_movements(transfer: &StockTransfer, code: &str) -> Vec<StockMovement> {
    let reference = LedgerRef::transfer(transfer.id);
    let when = start_of_day(transfer.date);

    transfer
        .details
        .iter()
        .flat_map(|d| {
            let unit_cost = d.unit_cost;
            let batch_number = shared::normalize_batch(d.batch_number.as_deref());
            let leg = |warehouse_id: i64, qty_in: Decimal, qty_out: Decimal| StockMovement {
                transaction_date: when,
                product_id: d.product_id,
                warehouse_id,
                branch_id: transfer.branch_id,
                reference,
                code: Some(code.to_string()),
                uom_id: d.unit_id,
                batch_number: batch_number.clone(),
                qty_in,
                qty_out,
                unit_cost,
                reversal_of: None,
            };
            [
                leg(transfer.from_warehouse_id, Decimal::ZERO, d.qty),
                leg(transfer.to_warehouse_id, d.qty, Decimal::ZERO),
            ]
        })
        .collect()
}

impl StockTransferService {
    /// Create a new StockTransferService instance
    pub fn new(db: PgPool, sequence_code: impl Into<String>) -> Self {
        Self {
            db,
            sequence_code: sequence_code.into(),
        }
    }

    pub async fn list(&self, filter: &TransferFilter) -> AppResult<PaginatedResponse<StockTransfer>> {
        let pagination = filter.pagination();
        let status = filter.status.map(|s| s.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM stock_transfers
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::bigint IS NULL OR from_warehouse_id = $2 OR to_warehouse_id = $2)
            "#,
        )
        .bind(status)
        .bind(filter.warehouse_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, TransferRow>(&format!(
            r#"
            SELECT {} FROM stock_transfers
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::bigint IS NULL OR from_warehouse_id = $2 OR to_warehouse_id = $2)
            ORDER BY date DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
            TRANSFER_COLUMNS
        ))
        .bind(status)
        .bind(filter.warehouse_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let mut conn = self.db.acquire().await?;
        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            let details = Self::load_details(&mut conn, row.id).await?;
            data.push(row.into_model(details)?);
        }

        Ok(PaginatedResponse::new(data, &pagination, total.max(0) as u64))
    }

    pub async fn get(&self, id: i64) -> AppResult<StockTransfer> {
        let mut conn = self.db.acquire().await?;
        Self::load(&mut conn, id, false).await
    }

    /// Save a draft; nothing is posted
    pub async fn create(&self, actor: Actor, input: TransferInput) -> AppResult<StockTransfer> {
        validate_input(&input)?;

        let code = input
            .code
            .clone()
            .unwrap_or_else(|| placeholder_code(&Uuid::new_v4().simple().to_string()));
        let branch_id = input.branch_id.or(actor.branch_id);

        let mut tx = self.db.begin().await?;
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO stock_transfers (
                code, date, from_warehouse_id, to_warehouse_id, description, status, branch_id,
                created_by, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING id
            "#,
        )
        .bind(&code)
        .bind(input.date)
        .bind(input.from_warehouse_id)
        .bind(input.to_warehouse_id)
        .bind(&input.description)
        .bind(TransferStatus::Draft.as_str())
        .bind(branch_id)
        .bind(actor.user_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_details(&mut tx, id, &input.details).await?;

        ActivityLogService::record_in(
            &mut tx,
            &DomainEvent::new(DocumentKind::StockTransfer, id, ActivityEvent::Created)
                .by(actor.user_id)
                .with_properties(json!({ "code": code, "lines": input.details.len() })),
        )
        .await?;

        let transfer = Self::load(&mut tx, id, false).await?;
        tx.commit().await?;

        tracing::info!(transfer_id = id, code = %transfer.code, "stock transfer drafted");
        Ok(transfer)
    }

    /// Replace header and lines of a draft
    pub async fn update(&self, id: i64, actor: Actor, input: TransferInput) -> AppResult<StockTransfer> {
        validate_input(&input)?;

        let mut tx = self.db.begin().await?;
        let current = Self::load(&mut tx, id, true).await?;
        current.status.apply(TransferAction::Update)?;

        let code = input.code.clone().unwrap_or_else(|| current.code.clone());
        let branch_id = input.branch_id.or(current.branch_id);

        sqlx::query(
            r#"
            UPDATE stock_transfers SET
                code = $2, date = $3, from_warehouse_id = $4, to_warehouse_id = $5,
                description = $6, branch_id = $7, updated_by = $8, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&code)
        .bind(input.date)
        .bind(input.from_warehouse_id)
        .bind(input.to_warehouse_id)
        .bind(&input.description)
        .bind(branch_id)
        .bind(actor.user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM stock_transfer_details WHERE stock_transfer_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Self::insert_details(&mut tx, id, &input.details).await?;

        ActivityLogService::record_in(
            &mut tx,
            &DomainEvent::new(DocumentKind::StockTransfer, id, ActivityEvent::Updated)
                .by(actor.user_id)
                .with_properties(json!({
                    "old": {
                        "code": current.code,
                        "date": current.date,
                        "from_warehouse_id": current.from_warehouse_id,
                        "to_warehouse_id": current.to_warehouse_id,
                        "description": current.description,
                    },
                    "attributes": {
                        "code": code,
                        "date": input.date,
                        "from_warehouse_id": input.from_warehouse_id,
                        "to_warehouse_id": input.to_warehouse_id,
                        "description": input.description,
                    },
                })),
        )
        .await?;

        let old_lines: Vec<DetailSnapshot> = current.details.iter().map(DetailSnapshot::from).collect();
        let new_lines: Vec<DetailSnapshot> = input.details.iter().map(TransferDetailInput::snapshot).collect();
        if let Some(diff) = detail_diff(&old_lines, &new_lines) {
            ActivityLogService::record_in(
                &mut tx,
                &DomainEvent::new(DocumentKind::StockTransfer, id, ActivityEvent::ChildrenUpdated)
                    .by(actor.user_id)
                    .with_properties(diff),
            )
            .await?;
        }

        let transfer = Self::load(&mut tx, id, false).await?;
        tx.commit().await?;

        tracing::info!(transfer_id = id, "stock transfer updated");
        Ok(transfer)
    }

    /// Delete a draft
    pub async fn delete(&self, id: i64, actor: Actor) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let current = Self::load(&mut tx, id, true).await?;
        current.status.apply(TransferAction::Delete)?;

        sqlx::query("DELETE FROM stock_transfers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        ActivityLogService::record_in(
            &mut tx,
            &DomainEvent::new(DocumentKind::StockTransfer, id, ActivityEvent::Deleted)
                .by(actor.user_id)
                .with_properties(json!({ "code": current.code })),
        )
        .await?;

        tx.commit().await?;
        tracing::info!(transfer_id = id, code = %current.code, "stock transfer deleted");
        Ok(())
    }

    /// Post a draft: check source stock, finalize the code, write both legs
    pub async fn approve(&self, id: i64, actor: Actor) -> AppResult<StockTransfer> {
        let mut tx = self.db.begin().await?;
        let transfer = Self::load(&mut tx, id, true).await?;
        transfer.status.apply(TransferAction::Approve)?;

        if transfer.details.is_empty() {
            return Err(AppError::InvalidTransition(
                "cannot approve a stock transfer without detail lines".to_string(),
            ));
        }

        StockLedgerService::lock_lanes(&mut tx, &transfer_lanes(&transfer)).await?;

        let lines = Self::base_lines(&mut tx, &transfer).await?;
        for requirement in lane_requirements(&lines, transfer.from_warehouse_id) {
            let available =
                StockLedgerService::available_qty_in(&mut tx, &requirement.lane, transfer.date).await?;
            if let Err(shortfall) = requirement.check(available) {
                tracing::warn!(
                    transfer_id = id,
                    lane = %shortfall.lane,
                    available = %shortfall.available,
                    required = %shortfall.required,
                    "stock transfer approval rejected"
                );
                return Err(shortfall.into());
            }
        }

        let code = if transfer.has_placeholder_code() {
            NumberSequenceService::generate_in(
                &mut tx,
                &self.sequence_code,
                transfer.branch_id.or(actor.branch_id),
                Some(transfer.date),
            )
            .await?
            .code
        } else {
            transfer.code.clone()
        };

        let reference = LedgerRef::transfer(id);
        StockLedgerService::delete_by_ref_in(&mut tx, reference).await?;
        StockLedgerService::record_batch_in(&mut tx, transfer_movements(&transfer, &code)).await?;

        sqlx::query(
            r#"
            UPDATE stock_transfers SET
                code = $2, status = $3, approved_by = $4, approved_at = NOW(),
                updated_by = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&code)
        .bind(TransferStatus::Posted.as_str())
        .bind(actor.user_id)
        .execute(&mut *tx)
        .await?;

        ActivityLogService::record_in(
            &mut tx,
            &DomainEvent::new(DocumentKind::StockTransfer, id, ActivityEvent::Approved)
                .by(actor.user_id)
                .with_properties(json!({ "code": code, "previous_code": transfer.code })),
        )
        .await?;

        let approved = Self::load(&mut tx, id, false).await?;
        tx.commit().await?;

        tracing::info!(transfer_id = id, code = %approved.code, "stock transfer approved");
        Ok(approved)
    }

    /// Return a posted transfer to draft, provided the received stock has
    /// not been consumed since
    pub async fn disapprove(&self, id: i64, actor: Actor) -> AppResult<StockTransfer> {
        let mut tx = self.db.begin().await?;
        let transfer = Self::load(&mut tx, id, true).await?;
        transfer.status.apply(TransferAction::Disapprove)?;

        StockLedgerService::lock_lanes(&mut tx, &transfer_lanes(&transfer)).await?;

        let lines = Self::base_lines(&mut tx, &transfer).await?;
        let from = start_of_day(transfer.date);
        for requirement in lane_requirements(&lines, transfer.to_warehouse_id) {
            let min_balance =
                StockLedgerService::min_balance_from_in(&mut tx, &requirement.lane, from).await?;
            if let Err(shortfall) = requirement.check(min_balance) {
                tracing::warn!(
                    transfer_id = id,
                    lane = %shortfall.lane,
                    min_balance = %shortfall.available,
                    to_remove = %shortfall.required,
                    "stock transfer disapproval rejected"
                );
                return Err(AppError::already_consumed(shortfall));
            }
        }

        StockLedgerService::delete_by_ref_in(&mut tx, LedgerRef::transfer(id)).await?;

        sqlx::query(
            r#"
            UPDATE stock_transfers SET
                status = $2, approved_by = NULL, approved_at = NULL,
                updated_by = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(TransferStatus::Draft.as_str())
        .bind(actor.user_id)
        .execute(&mut *tx)
        .await?;

        ActivityLogService::record_in(
            &mut tx,
            &DomainEvent::new(DocumentKind::StockTransfer, id, ActivityEvent::Unapproved)
                .by(actor.user_id)
                .with_properties(json!({ "code": transfer.code })),
        )
        .await?;

        let draft = Self::load(&mut tx, id, false).await?;
        tx.commit().await?;

        tracing::info!(transfer_id = id, "stock transfer disapproved");
        Ok(draft)
    }

    async fn base_lines(conn: &mut PgConnection, transfer: &StockTransfer) -> AppResult<Vec<BaseLine>> {
        let mut lines = Vec::with_capacity(transfer.details.len());
        for d in &transfer.details {
            lines.push(BaseLine {
                product_id: d.product_id,
                batch_number: d.batch_number.clone(),
                base_qty: ProductUnitLookup::to_base(conn, d.product_id, d.unit_id, d.qty).await?,
            });
        }
        Ok(lines)
    }

    async fn load(conn: &mut PgConnection, id: i64, for_update: bool) -> AppResult<StockTransfer> {
        let lock = if for_update { " FOR UPDATE" } else { "" };
        let row = sqlx::query_as::<_, TransferRow>(&format!(
            "SELECT {} FROM stock_transfers WHERE id = $1{}",
            TRANSFER_COLUMNS, lock
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock transfer".to_string()))?;

        let details = Self::load_details(conn, id).await?;
        row.into_model(details)
    }

    async fn load_details(conn: &mut PgConnection, id: i64) -> AppResult<Vec<StockTransferDetail>> {
        let rows = sqlx::query_as::<_, TransferDetailRow>(
            r#"
            SELECT id, product_id, batch_number, unit_id, qty, unit_cost, description
            FROM stock_transfer_details
            WHERE stock_transfer_id = $1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.into_iter().map(StockTransferDetail::from).collect())
    }

    async fn insert_details(
        conn: &mut PgConnection,
        id: i64,
        details: &[TransferDetailInput],
    ) -> AppResult<()> {
        for d in details {
            sqlx::query(
                r#"
                INSERT INTO stock_transfer_details (
                    stock_transfer_id, product_id, batch_number, unit_id, qty, unit_cost, description
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(id)
            .bind(d.product_id)
            .bind(shared::normalize_batch(d.batch_number.as_deref()))
            .bind(d.unit_id)
            .bind(d.qty)
            .bind(d.unit_cost.unwrap_or(Decimal::ZERO))
            .bind(&d.description)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }
}

fn validate_input(input: &TransferInput) -> AppResult<()> {
    input.validate()?;
    shared::validate_transfer_warehouses(input.from_warehouse_id, input.to_warehouse_id)
        .map_err(|m| AppError::validation("to_warehouse_id", m))?;
    shared::validate_has_details(input.details.len()).map_err(|m| AppError::validation("details", m))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(details: Vec<StockTransferDetail>) -> StockTransfer {
        let now = Utc::now();
        StockTransfer {
            id: 3,
            uuid: Uuid::new_v4(),
            code: "DRAFT-abc".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
            from_warehouse_id: 1,
            to_warehouse_id: 2,
            description: None,
            status: TransferStatus::Draft,
            branch_id: Some(5),
            approved_by: None,
            approved_at: None,
            details,
            created_by: None,
            updated_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(id: i64, product_id: i64, qty: i64, batch: Option<&str>) -> StockTransferDetail {
        StockTransferDetail {
            id,
            product_id,
            batch_number: batch.map(str::to_string),
            unit_id: 1,
            qty: Decimal::from(qty),
            unit_cost: Decimal::from(2),
            description: None,
        }
    }

    #[test]
    fn test_transfer_movements_pair_out_and_in() {
        let t = transfer(vec![line(1, 10, 4, None)]);
        let movements = transfer_movements(&t, "TRF/BDG/2026/03/0001");

        assert_eq!(movements.len(), 2);
        let (out, inbound) = (&movements[0], &movements[1]);
        assert_eq!(out.warehouse_id, 1);
        assert_eq!(out.qty_out, Decimal::from(4));
        assert_eq!(out.qty_in, Decimal::ZERO);
        assert_eq!(inbound.warehouse_id, 2);
        assert_eq!(inbound.qty_in, Decimal::from(4));
        assert_eq!(out.reference, inbound.reference);
        assert_eq!(inbound.code.as_deref(), Some("TRF/BDG/2026/03/0001"));
        assert_eq!(inbound.branch_id, Some(5));
    }

    #[test]
    fn test_lane_requirements_sum_same_batch() {
        let lines = vec![
            BaseLine { product_id: 10, batch_number: None, base_qty: Decimal::from(5) },
            BaseLine { product_id: 10, batch_number: None, base_qty: Decimal::from(3) },
            BaseLine { product_id: 10, batch_number: Some("B1".into()), base_qty: Decimal::from(1) },
        ];
        let reqs = lane_requirements(&lines, 1);
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].lane, LaneKey::new(10, 1, None));
        assert_eq!(reqs[0].required, Decimal::from(8));
    }

    #[test]
    fn test_transfer_lanes_cover_both_sides() {
        let t = transfer(vec![line(1, 10, 4, Some("B1"))]);
        let lanes = transfer_lanes(&t);
        assert!(lanes.contains(&LaneKey::new(10, 1, Some("B1"))));
        assert!(lanes.contains(&LaneKey::new(10, 2, Some("B1"))));
    }

    #[test]
    fn test_validate_input_same_warehouse() {
        let input = TransferInput {
            code: None,
            date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
            from_warehouse_id: 1,
            to_warehouse_id: 1,
            branch_id: None,
            description: None,
            details: vec![TransferDetailInput {
                product_id: 1,
                batch_number: None,
                unit_id: 1,
                qty: Decimal::ONE,
                unit_cost: None,
                description: None,
            }],
        };
        match validate_input(&input) {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "to_warehouse_id"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
