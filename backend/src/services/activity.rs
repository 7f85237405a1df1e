//! Activity log service
//!
//! Persists domain events raised by the document services. Events are
//! written on the caller's connection so they commit or roll back with the
//! change they describe.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use shared::models::{ActivityLog, DocumentKind, DomainEvent};

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct ActivityLogService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct ActivityRow {
    id: i64,
    subject_type: String,
    subject_id: i64,
    event: String,
    description: String,
    causer_id: Option<Uuid>,
    properties: Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for ActivityLog {
    type Error = AppError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        Ok(ActivityLog {
            id: row.id,
            subject_type: row.subject_type,
            subject_id: row.subject_id,
            event: row.event.parse()?,
            description: row.description,
            causer_id: row.causer_id,
            properties: row.properties,
            created_at: row.created_at,
        })
    }
}

impl ActivityLogService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn record_in(conn: &mut PgConnection, event: &DomainEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (subject_type, subject_id, event, description, causer_id, properties)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.subject.as_str())
        .bind(event.subject_id)
        .bind(event.event.as_str())
        .bind(event.description())
        .bind(event.causer_id)
        .bind(&event.properties)
        .execute(&mut *conn)
        .await?;

        tracing::debug!(
            subject = %event.subject,
            subject_id = event.subject_id,
            event = event.event.as_str(),
            "activity recorded"
        );
        Ok(())
    }

    /// Activity of one document, oldest first
    pub async fn for_subject(&self, subject: DocumentKind, subject_id: i64) -> AppResult<Vec<ActivityLog>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT id, subject_type, subject_id, event, description, causer_id, properties, created_at
            FROM activity_logs
            WHERE subject_type = $1 AND subject_id = $2
            ORDER BY id
            "#,
        )
        .bind(subject.as_str())
        .bind(subject_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ActivityLog::try_from).collect()
    }
}
