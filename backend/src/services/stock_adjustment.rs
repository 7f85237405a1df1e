//! Stock adjustment service
//!
//! Adjustments post to the ledger as soon as they are saved. Edits and
//! deletes append reversal rows rather than erasing the earlier postings.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::models::{
    detail_diff, ActivityEvent, AdjustmentStatus, DetailSnapshot, Direction, DocumentKind,
    DomainEvent, LedgerRef, StockAdjustment, StockAdjustmentDetail, StockMovement,
};
use shared::types::{start_of_day, PaginatedResponse, Pagination};

use crate::error::{AppError, AppResult};
use crate::services::{
    non_negative_cost, positive_quantity, ActivityLogService, Actor, NumberSequenceService,
    StockLedgerService,
};

/// Stock adjustment service
#[derive(Clone)]
pub struct StockAdjustmentService {
    db: PgPool,
    sequence_code: String,
}

/// Header and lines of an adjustment, used for both create and update
#[derive(Debug, Deserialize, Validate)]
pub struct AdjustmentInput {
    pub date: NaiveDate,
    pub warehouse_id: i64,
    pub adjustment_type_id: i64,
    pub branch_id: Option<i64>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate]
    pub details: Vec<AdjustmentDetailInput>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdjustmentDetailInput {
    pub product_id: i64,
    pub direction: Direction,
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

impl AdjustmentDetailInput {
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
pub struct AdjustmentFilter {
    pub status: Option<AdjustmentStatus>,
    pub warehouse_id: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl AdjustmentFilter {
    pub fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

#[derive(Debug, FromRow)]
struct AdjustmentRow {
    id: i64,
    uuid: Uuid,
    code: String,
    date: NaiveDate,
    warehouse_id: i64,
    adjustment_type_id: i64,
    branch_id: Option<i64>,
    description: Option<String>,
    status: String,
    created_by: Option<Uuid>,
    updated_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AdjustmentRow {
    fn into_model(self, details: Vec<StockAdjustmentDetail>) -> AppResult<StockAdjustment> {
        Ok(StockAdjustment {
            id: self.id,
            uuid: self.uuid,
            code: self.code,
            date: self.date,
            warehouse_id: self.warehouse_id,
            adjustment_type_id: self.adjustment_type_id,
            branch_id: self.branch_id,
            description: self.description,
            status: self.status.parse()?,
            details,
            created_by: self.created_by,
            updated_by: self.updated_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct AdjustmentDetailRow {
    id: i64,
    product_id: i64,
    direction: String,
    batch_number: Option<String>,
    unit_id: i64,
    qty: Decimal,
    unit_cost: Decimal,
    description: Option<String>,
}

impl TryFrom<AdjustmentDetailRow> for StockAdjustmentDetail {
    type Error = AppError;

    fn try_from(row: AdjustmentDetailRow) -> Result<Self, Self::Error> {
        Ok(StockAdjustmentDetail {
            id: row.id,
            product_id: row.product_id,
            direction: row.direction.parse()?,
            batch_number: row.batch_number,
            unit_id: row.unit_id,
            qty: row.qty,
            unit_cost: row.unit_cost,
            description: row.description,
        })
    }
}

const ADJUSTMENT_COLUMNS: &str = "id, uuid, code, date, warehouse_id, adjustment_type_id, \
     branch_id, description, status, created_by, updated_by, created_at, updated_at";

/// Header fields every ledger row of an adjustment carries
struct PostingContext<'a> {
    id: i64,
    code: &'a str,
    date: NaiveDate,
    warehouse_id: i64,
    branch_id: Option<i64>,
}

/// One ledger movement per line, dated at the start of the document date
fn adjustment_movements(ctx: &PostingContext<'_>, details: &[AdjustmentDetailInput]) -> Vec<StockMovement> {
    details
        .iter()
        .map(|d| {
            let (qty_in, qty_out) = d.direction.split(d.qty);
            StockMovement {
                transaction_date: start_of_day(ctx.date),
                product_id: d.product_id,
                warehouse_id: ctx.warehouse_id,
                branch_id: ctx.branch_id,
                reference: LedgerRef::adjustment(ctx.id),
                code: Some(ctx.code.to_string()),
                uom_id: d.unit_id,
                batch_number: shared::normalize_batch(d.batch_number.as_deref()),
                qty_in,
                qty_out,
                unit_cost: d.unit_cost.unwrap_or(Decimal::ZERO),
                reversal_of: None,
            }
        })
        .collect()
}

impl StockAdjustmentService {
    /// Create a new StockAdjustmentService instance
    pub fn new(db: PgPool, sequence_code: impl Into<String>) -> Self {
        Self {
            db,
            sequence_code: sequence_code.into(),
        }
    }

    pub async fn list(&self, filter: &AdjustmentFilter) -> AppResult<PaginatedResponse<StockAdjustment>> {
        let pagination = filter.pagination();
        let status = filter.status.map(|s| s.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM stock_adjustments
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::bigint IS NULL OR warehouse_id = $2)
            "#,
        )
        .bind(status)
        .bind(filter.warehouse_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, AdjustmentRow>(&format!(
            r#"
            SELECT {} FROM stock_adjustments
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::bigint IS NULL OR warehouse_id = $2)
            ORDER BY date DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
            ADJUSTMENT_COLUMNS
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

    pub async fn get(&self, id: i64) -> AppResult<StockAdjustment> {
        let mut conn = self.db.acquire().await?;
        Self::load(&mut conn, id).await
    }

    /// Save a new adjustment and post its lines
    pub async fn create(&self, actor: Actor, input: AdjustmentInput) -> AppResult<StockAdjustment> {
        validate_input(&input)?;

        let mut tx = self.db.begin().await?;
        let branch_id = input.branch_id.or(actor.branch_id);
        let code =
            NumberSequenceService::generate_in(&mut tx, &self.sequence_code, branch_id, Some(input.date))
                .await?
                .code;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO stock_adjustments (
                code, date, warehouse_id, adjustment_type_id, branch_id, description, status,
                created_by, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING id
            "#,
        )
        .bind(&code)
        .bind(input.date)
        .bind(input.warehouse_id)
        .bind(input.adjustment_type_id)
        .bind(branch_id)
        .bind(&input.description)
        .bind(AdjustmentStatus::Posted.as_str())
        .bind(actor.user_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_details(&mut tx, id, &input.details).await?;

        let ctx = PostingContext {
            id,
            code: &code,
            date: input.date,
            warehouse_id: input.warehouse_id,
            branch_id,
        };
        StockLedgerService::record_batch_in(&mut tx, adjustment_movements(&ctx, &input.details)).await?;

        ActivityLogService::record_in(
            &mut tx,
            &DomainEvent::new(DocumentKind::StockAdjustment, id, ActivityEvent::Created)
                .by(actor.user_id)
                .with_properties(json!({ "code": code, "lines": input.details.len() })),
        )
        .await?;

        let adjustment = Self::load(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(adjustment_id = id, code = %adjustment.code, "stock adjustment posted");
        Ok(adjustment)
    }

    /// Replace header and lines; earlier postings are reversed, not erased
    pub async fn update(&self, id: i64, actor: Actor, input: AdjustmentInput) -> AppResult<StockAdjustment> {
        validate_input(&input)?;

        let mut tx = self.db.begin().await?;
        let current = Self::lock(&mut tx, id).await?;
        if !current.status.is_editable() {
            return Err(AppError::InvalidTransition(format!(
                "cannot update a {} stock adjustment",
                current.status.as_str()
            )));
        }

        let old_lines: Vec<DetailSnapshot> = current
            .details
            .iter()
            .map(|d| DetailSnapshot {
                product_id: d.product_id,
                qty: d.qty,
                unit_id: d.unit_id,
                batch: d.batch_number.clone(),
            })
            .collect();

        StockLedgerService::reverse_in(&mut tx, LedgerRef::adjustment(id), Utc::now()).await?;

        let branch_id = input.branch_id.or(current.branch_id);
        sqlx::query(
            r#"
            UPDATE stock_adjustments SET
                date = $2, warehouse_id = $3, adjustment_type_id = $4, branch_id = $5,
                description = $6, status = $7, updated_by = $8, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.date)
        .bind(input.warehouse_id)
        .bind(input.adjustment_type_id)
        .bind(branch_id)
        .bind(&input.description)
        .bind(AdjustmentStatus::Posted.as_str())
        .bind(actor.user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM stock_adjustment_details WHERE stock_adjustment_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Self::insert_details(&mut tx, id, &input.details).await?;

        let ctx = PostingContext {
            id,
            code: &current.code,
            date: input.date,
            warehouse_id: input.warehouse_id,
            branch_id,
        };
        StockLedgerService::record_batch_in(&mut tx, adjustment_movements(&ctx, &input.details)).await?;

        ActivityLogService::record_in(
            &mut tx,
            &DomainEvent::new(DocumentKind::StockAdjustment, id, ActivityEvent::Updated)
                .by(actor.user_id)
                .with_properties(json!({
                    "old": { "date": current.date, "warehouse_id": current.warehouse_id, "description": current.description },
                    "attributes": { "date": input.date, "warehouse_id": input.warehouse_id, "description": input.description },
                })),
        )
        .await?;

        let new_lines: Vec<DetailSnapshot> = input.details.iter().map(AdjustmentDetailInput::snapshot).collect();
        if let Some(diff) = detail_diff(&old_lines, &new_lines) {
            ActivityLogService::record_in(
                &mut tx,
                &DomainEvent::new(DocumentKind::StockAdjustment, id, ActivityEvent::ChildrenUpdated)
                    .by(actor.user_id)
                    .with_properties(diff),
            )
            .await?;
        }

        let adjustment = Self::load(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(adjustment_id = id, "stock adjustment updated");
        Ok(adjustment)
    }

    /// Reverse the postings, then remove the document
    pub async fn delete(&self, id: i64, actor: Actor) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let current = Self::lock(&mut tx, id).await?;

        StockLedgerService::reverse_in(&mut tx, LedgerRef::adjustment(id), Utc::now()).await?;

        sqlx::query("DELETE FROM stock_adjustments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        ActivityLogService::record_in(
            &mut tx,
            &DomainEvent::new(DocumentKind::StockAdjustment, id, ActivityEvent::Deleted)
                .by(actor.user_id)
                .with_properties(json!({ "code": current.code })),
        )
        .await?;

        tx.commit().await?;
        tracing::info!(adjustment_id = id, code = %current.code, "stock adjustment deleted");
        Ok(())
    }

    async fn lock(conn: &mut PgConnection, id: i64) -> AppResult<StockAdjustment> {
        let row = sqlx::query_as::<_, AdjustmentRow>(&format!(
            "SELECT {} FROM stock_adjustments WHERE id = $1 FOR UPDATE",
            ADJUSTMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock adjustment".to_string()))?;

        let details = Self::load_details(conn, id).await?;
        row.into_model(details)
    }

    async fn load(conn: &mut PgConnection, id: i64) -> AppResult<StockAdjustment> {
        let row = sqlx::query_as::<_, AdjustmentRow>(&format!(
            "SELECT {} FROM stock_adjustments WHERE id = $1",
            ADJUSTMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock adjustment".to_string()))?;

        let details = Self::load_details(conn, id).await?;
        row.into_model(details)
    }

    async fn load_details(conn: &mut PgConnection, id: i64) -> AppResult<Vec<StockAdjustmentDetail>> {
        sqlx::query_as::<_, AdjustmentDetailRow>(
            r#"
            SELECT id, product_id, direction, batch_number, unit_id, qty, unit_cost, description
            FROM stock_adjustment_details
            WHERE stock_adjustment_id = $1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(StockAdjustmentDetail::try_from)
        .collect()
    }

    async fn insert_details(
        conn: &mut PgConnection,
        id: i64,
        details: &[AdjustmentDetailInput],
    ) -> AppResult<()> {
        for d in details {
            sqlx::query(
                r#"
                INSERT INTO stock_adjustment_details (
                    stock_adjustment_id, product_id, direction, batch_number, unit_id, qty,
                    unit_cost, description
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(id)
            .bind(d.product_id)
            .bind(d.direction.as_str())
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

fn validate_input(input: &AdjustmentInput) -> AppResult<()> {
    input.validate()?;
    shared::validate_has_details(input.details.len()).map_err(|m| AppError::validation("details", m))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(direction: Direction, qty: i64, batch: Option<&str>) -> AdjustmentDetailInput {
        AdjustmentDetailInput {
            product_id: 1,
            direction,
            batch_number: batch.map(str::to_string),
            unit_id: 1,
            qty: Decimal::from(qty),
            unit_cost: None,
            description: None,
        }
    }

    #[test]
    fn test_adjustment_movements_split_directions() {
        let ctx = PostingContext {
            id: 12,
            code: "ADJ/2026/03/0001",
            date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
            warehouse_id: 4,
            branch_id: Some(2),
        };
        let movements = adjustment_movements(
            &ctx,
            &[detail(Direction::In, 10, Some(" B1 ")), detail(Direction::Out, 3, Some(""))],
        );

        assert_eq!(movements.len(), 2);
        assert_eq!(movements[0].qty_in, Decimal::from(10));
        assert_eq!(movements[0].qty_out, Decimal::ZERO);
        assert_eq!(movements[0].batch_number.as_deref(), Some("B1"));
        assert_eq!(movements[1].qty_out, Decimal::from(3));
        assert_eq!(movements[1].batch_number, None);
        assert_eq!(movements[1].reference, LedgerRef::adjustment(12));
        assert_eq!(movements[1].transaction_date, start_of_day(ctx.date));
        assert_eq!(movements[1].code.as_deref(), Some("ADJ/2026/03/0001"));
    }

    #[test]
    fn test_validate_input_requires_lines() {
        let input = AdjustmentInput {
            date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
            warehouse_id: 1,
            adjustment_type_id: 1,
            branch_id: None,
            description: None,
            details: vec![],
        };
        assert!(matches!(validate_input(&input), Err(AppError::Validation { .. })));
    }

    #[test]
    fn test_validate_input_rejects_zero_qty() {
        let input = AdjustmentInput {
            date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
            warehouse_id: 1,
            adjustment_type_id: 1,
            branch_id: None,
            description: None,
            details: vec![detail(Direction::In, 0, None)],
        };
        assert!(matches!(validate_input(&input), Err(AppError::ValidationErrors(_))));
    }

    #[test]
    fn test_validate_input_rejects_oversized_amounts() {
        let mut line = detail(Direction::In, 1_000_000_000_000_000, None);
        line.unit_cost = Some(Decimal::from(1_000_000_000_000_000i64));
        let input = AdjustmentInput {
            date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
            warehouse_id: 1,
            adjustment_type_id: 1,
            branch_id: None,
            description: None,
            details: vec![line],
        };
        assert!(matches!(validate_input(&input), Err(AppError::ValidationErrors(_))));
    }
}
