//! Number sequence service
//!
//! Administers sequence definitions and mints document codes. Counters live
//! one row per `(sequence, scope_key)` and are incremented under a row lock,
//! so concurrent callers on the same scope always receive distinct numbers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use shared::models::{preview_format, FormatTemplate, NumberSequence, ResetPolicy, ScopeType};
use shared::types::{PaginatedResponse, Pagination};

use crate::error::{AppError, AppResult};
use crate::services::Actor;

/// Number sequence service
#[derive(Clone)]
pub struct NumberSequenceService {
    db: PgPool,
}

const SEQUENCE_COLUMNS: &str = "id, uuid, code, name, prefix, separator, format, reset_type, \
     scope_type, sequence_length, is_active, created_at, updated_at";

#[derive(Debug, FromRow)]
struct SequenceRow {
    id: i64,
    uuid: Uuid,
    code: String,
    name: String,
    prefix: String,
    separator: String,
    format: String,
    reset_type: String,
    scope_type: String,
    sequence_length: i16,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SequenceRow> for NumberSequence {
    type Error = AppError;

    fn try_from(row: SequenceRow) -> Result<Self, Self::Error> {
        Ok(NumberSequence {
            id: row.id,
            uuid: row.uuid,
            code: row.code,
            name: row.name,
            prefix: row.prefix,
            separator: row.separator,
            format: row.format,
            reset_type: row.reset_type.parse()?,
            scope_type: row.scope_type.parse()?,
            sequence_length: row.sequence_length,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn sequence_code(value: &str) -> Result<(), ValidationError> {
    shared::validate_sequence_code(value).map_err(ValidationError::new)
}

fn sequence_format(value: &str) -> Result<(), ValidationError> {
    shared::validate_sequence_format(value).map_err(ValidationError::new)
}

/// Input for creating a number sequence
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSequenceInput {
    #[validate(custom = "sequence_code")]
    pub code: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 20))]
    pub prefix: String,
    #[validate(length(max = 5))]
    #[serde(default = "default_separator")]
    pub separator: String,
    #[validate(custom = "sequence_format")]
    pub format: String,
    #[serde(default)]
    pub reset_type: ResetPolicy,
    #[serde(default)]
    pub scope_type: ScopeType,
    #[validate(range(min = 1, max = 12))]
    #[serde(default = "default_sequence_length")]
    pub sequence_length: i16,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_separator() -> String {
    "/".to_string()
}

fn default_sequence_length() -> i16 {
    4
}

fn default_true() -> bool {
    true
}

/// Input for updating a number sequence
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSequenceInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 20))]
    pub prefix: Option<String>,
    #[validate(length(max = 5))]
    pub separator: Option<String>,
    #[validate(custom = "sequence_format")]
    pub format: Option<String>,
    pub reset_type: Option<ResetPolicy>,
    pub scope_type: Option<ScopeType>,
    #[validate(range(min = 1, max = 12))]
    pub sequence_length: Option<i16>,
    pub is_active: Option<bool>,
}

/// Input for previewing a format without touching any counter
#[derive(Debug, Deserialize, Validate)]
pub struct PreviewFormatInput {
    #[validate(length(max = 20))]
    pub prefix: String,
    #[serde(default = "default_separator")]
    pub separator: String,
    pub format: String,
    #[validate(range(min = 1, max = 12))]
    #[serde(default = "default_sequence_length")]
    pub sequence_length: i16,
    #[serde(default)]
    pub scope_type: ScopeType,
    pub branch_code: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewFormatResponse {
    pub preview: String,
}

/// A minted or peeked code with the counter it came from
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedCode {
    pub code: String,
    pub number: i64,
    pub scope_key: String,
}

impl NumberSequenceService {
    /// Create a new NumberSequenceService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, pagination: &Pagination) -> AppResult<PaginatedResponse<NumberSequence>> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM number_sequences")
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, SequenceRow>(&format!(
            "SELECT {} FROM number_sequences ORDER BY code LIMIT $1 OFFSET $2",
            SEQUENCE_COLUMNS
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let data = rows
            .into_iter()
            .map(NumberSequence::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        Ok(PaginatedResponse::new(data, pagination, total.max(0) as u64))
    }

    /// Active sequences, for pickers
    pub async fn list_active(&self) -> AppResult<Vec<NumberSequence>> {
        let rows = sqlx::query_as::<_, SequenceRow>(&format!(
            "SELECT {} FROM number_sequences WHERE is_active ORDER BY code",
            SEQUENCE_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(NumberSequence::try_from).collect()
    }

    pub async fn get(&self, id: i64) -> AppResult<NumberSequence> {
        sqlx::query_as::<_, SequenceRow>(&format!(
            "SELECT {} FROM number_sequences WHERE id = $1",
            SEQUENCE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Number sequence".to_string()))?
        .try_into()
    }

    pub async fn create(&self, input: CreateSequenceInput) -> AppResult<NumberSequence> {
        input.validate()?;

        let row = sqlx::query_as::<_, SequenceRow>(&format!(
            r#"
            INSERT INTO number_sequences (
                code, name, prefix, separator, format, reset_type, scope_type,
                sequence_length, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            SEQUENCE_COLUMNS
        ))
        .bind(&input.code)
        .bind(&input.name)
        .bind(&input.prefix)
        .bind(&input.separator)
        .bind(&input.format)
        .bind(input.reset_type.as_str())
        .bind(input.scope_type.as_str())
        .bind(input.sequence_length)
        .bind(input.is_active)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(code = %row.code, "created number sequence");
        row.try_into()
    }

    pub async fn update(&self, id: i64, input: UpdateSequenceInput) -> AppResult<NumberSequence> {
        input.validate()?;

        let row = sqlx::query_as::<_, SequenceRow>(&format!(
            r#"
            UPDATE number_sequences SET
                name = COALESCE($2, name),
                prefix = COALESCE($3, prefix),
                separator = COALESCE($4, separator),
                format = COALESCE($5, format),
                reset_type = COALESCE($6, reset_type),
                scope_type = COALESCE($7, scope_type),
                sequence_length = COALESCE($8, sequence_length),
                is_active = COALESCE($9, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SEQUENCE_COLUMNS
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.prefix)
        .bind(&input.separator)
        .bind(&input.format)
        .bind(input.reset_type.map(|r| r.as_str()))
        .bind(input.scope_type.map(|s| s.as_str()))
        .bind(input.sequence_length)
        .bind(input.is_active)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Number sequence".to_string()))?;

        row.try_into()
    }

    /// Delete a definition that has never issued a number
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM number_sequences WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        if exists.is_none() {
            return Err(AppError::NotFound("Number sequence".to_string()));
        }

        let used = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM number_sequence_counters WHERE number_sequence_id = $1 AND last_number > 0)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if used {
            return Err(AppError::Conflict {
                resource: "number_sequence".to_string(),
                message: "Number sequence has already issued numbers and cannot be deleted"
                    .to_string(),
            });
        }

        sqlx::query("DELETE FROM number_sequences WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Render a format with the sample number 1
    pub fn preview_format(&self, input: &PreviewFormatInput) -> AppResult<PreviewFormatResponse> {
        input.validate()?;

        let template = FormatTemplate {
            prefix: &input.prefix,
            separator: &input.separator,
            format: &input.format,
            sequence_length: input.sequence_length.max(0) as usize,
        };
        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());

        Ok(PreviewFormatResponse {
            preview: preview_format(&template, input.scope_type, input.branch_code.as_deref(), date),
        })
    }

    /// Mint the next code of `code` in its own transaction
    pub async fn generate(
        &self,
        code: &str,
        branch_id: Option<i64>,
        date: Option<NaiveDate>,
        actor: Actor,
    ) -> AppResult<GeneratedCode> {
        let mut tx = self.db.begin().await?;
        let generated = Self::generate_in(&mut tx, code, branch_id.or(actor.branch_id), date).await?;
        tx.commit().await?;
        Ok(generated)
    }

    /// Next code without consuming it. Advisory only.
    pub async fn peek(
        &self,
        code: &str,
        branch_id: Option<i64>,
        date: Option<NaiveDate>,
        actor: Actor,
    ) -> AppResult<GeneratedCode> {
        let mut conn = self.db.acquire().await?;
        let sequence = Self::active_by_code(&mut conn, code).await?;
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let branch_code =
            Self::resolve_branch_code(&mut conn, &sequence, branch_id.or(actor.branch_id)).await?;
        let scope_key = sequence.scope_key(branch_code.as_deref(), date);

        let last = sqlx::query_scalar::<_, i64>(
            "SELECT last_number FROM number_sequence_counters WHERE number_sequence_id = $1 AND scope_key = $2",
        )
        .bind(sequence.id)
        .bind(&scope_key)
        .fetch_optional(&mut *conn)
        .await?
        .unwrap_or(0);

        let number = last + 1;
        Ok(GeneratedCode {
            code: sequence.format_number(number, branch_code.as_deref(), date),
            number,
            scope_key,
        })
    }

    /// Increment the scope's counter inside the caller's transaction
    pub async fn generate_in(
        conn: &mut PgConnection,
        code: &str,
        branch_id: Option<i64>,
        date: Option<NaiveDate>,
    ) -> AppResult<GeneratedCode> {
        let sequence = Self::active_by_code(conn, code).await?;
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let branch_code = Self::resolve_branch_code(conn, &sequence, branch_id).await?;
        let scope_key = sequence.scope_key(branch_code.as_deref(), date);

        sqlx::query(
            r#"
            INSERT INTO number_sequence_counters (number_sequence_id, scope_key, last_number)
            VALUES ($1, $2, 0)
            ON CONFLICT (number_sequence_id, scope_key) DO NOTHING
            "#,
        )
        .bind(sequence.id)
        .bind(&scope_key)
        .execute(&mut *conn)
        .await?;

        let counter_id = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id FROM number_sequence_counters
            WHERE number_sequence_id = $1 AND scope_key = $2
            FOR UPDATE
            "#,
        )
        .bind(sequence.id)
        .bind(&scope_key)
        .fetch_one(&mut *conn)
        .await?;

        let number = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE number_sequence_counters
            SET last_number = last_number + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING last_number
            "#,
        )
        .bind(counter_id)
        .fetch_one(&mut *conn)
        .await?;

        let formatted = sequence.format_number(number, branch_code.as_deref(), date);
        tracing::info!(sequence = %sequence.code, scope_key = %scope_key, number, code = %formatted, "generated document code");

        Ok(GeneratedCode {
            code: formatted,
            number,
            scope_key,
        })
    }

    async fn active_by_code(conn: &mut PgConnection, code: &str) -> AppResult<NumberSequence> {
        sqlx::query_as::<_, SequenceRow>(&format!(
            "SELECT {} FROM number_sequences WHERE code = $1 AND is_active",
            SEQUENCE_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Number sequence '{}'", code)))?
        .try_into()
    }

    /// Branch code for branch-scoped sequences; `None` drops the segment
    async fn resolve_branch_code(
        conn: &mut PgConnection,
        sequence: &NumberSequence,
        branch_id: Option<i64>,
    ) -> AppResult<Option<String>> {
        if !sequence.is_branch_scoped() {
            return Ok(None);
        }
        let Some(branch_id) = branch_id else {
            tracing::debug!(sequence = %sequence.code, "no branch resolved, using global scope");
            return Ok(None);
        };

        let code = sqlx::query_scalar::<_, String>("SELECT code FROM branches WHERE id = $1")
            .bind(branch_id)
            .fetch_optional(&mut *conn)
            .await?;
        if code.is_none() {
            tracing::debug!(branch_id, "unknown branch, using global scope");
        }
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview_input(format: &str) -> PreviewFormatInput {
        PreviewFormatInput {
            prefix: "TRF".to_string(),
            separator: "/".to_string(),
            format: format.to_string(),
            sequence_length: 4,
            scope_type: ScopeType::Branch,
            branch_code: Some("BDG".to_string()),
            date: NaiveDate::from_ymd_opt(2026, 3, 15),
        }
    }

    #[test]
    fn test_create_input_rejects_format_without_seq() {
        let input = CreateSequenceInput {
            code: "stock-transfer".to_string(),
            name: "Stock Transfer".to_string(),
            prefix: "TRF".to_string(),
            separator: "/".to_string(),
            format: "{prefix}{sep}{YYYY}".to_string(),
            reset_type: ResetPolicy::Monthly,
            scope_type: ScopeType::Branch,
            sequence_length: 4,
            is_active: true,
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("format"));
    }

    #[test]
    fn test_create_input_defaults() {
        let input: CreateSequenceInput = serde_json::from_value(serde_json::json!({
            "code": "branch",
            "name": "Branch",
            "prefix": "CBG",
            "format": "{prefix}-{seq}"
        }))
        .unwrap();
        assert_eq!(input.separator, "/");
        assert_eq!(input.sequence_length, 4);
        assert_eq!(input.reset_type, ResetPolicy::Monthly);
        assert_eq!(input.scope_type, ScopeType::Global);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_preview_format_input() {
        let input = preview_input("{prefix}{sep}{branch}{sep}{YYYY}{sep}{MM}{sep}{seq}");
        let template = FormatTemplate {
            prefix: &input.prefix,
            separator: &input.separator,
            format: &input.format,
            sequence_length: 4,
        };
        let preview = preview_format(
            &template,
            input.scope_type,
            input.branch_code.as_deref(),
            input.date.unwrap(),
        );
        assert_eq!(preview, "TRF/BDG/2026/03/0001");
    }
}
