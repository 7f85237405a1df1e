//! Activity log events emitted by document services

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use uuid::Uuid;

use super::{DetailSnapshot, DocumentKind, ParseEnumError};

/// What happened to a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEvent {
    Created,
    Updated,
    ChildrenUpdated,
    Deleted,
    Approved,
    Unapproved,
}

impl ActivityEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityEvent::Created => "created",
            ActivityEvent::Updated => "updated",
            ActivityEvent::ChildrenUpdated => "children_updated",
            ActivityEvent::Deleted => "deleted",
            ActivityEvent::Approved => "approved",
            ActivityEvent::Unapproved => "unapproved",
        }
    }
}

impl FromStr for ActivityEvent {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ActivityEvent::Created),
            "updated" => Ok(ActivityEvent::Updated),
            "children_updated" => Ok(ActivityEvent::ChildrenUpdated),
            "deleted" => Ok(ActivityEvent::Deleted),
            "approved" => Ok(ActivityEvent::Approved),
            "unapproved" => Ok(ActivityEvent::Unapproved),
            other => Err(ParseEnumError::new("activity event", other)),
        }
    }
}

/// A domain event raised by a document service
#[derive(Debug, Clone, Serialize)]
pub struct DomainEvent {
    pub subject: DocumentKind,
    pub subject_id: i64,
    pub event: ActivityEvent,
    pub causer_id: Option<Uuid>,
    pub properties: Value,
}

impl DomainEvent {
    pub fn new(subject: DocumentKind, subject_id: i64, event: ActivityEvent) -> Self {
        Self {
            subject,
            subject_id,
            event,
            causer_id: None,
            properties: Value::Null,
        }
    }

    pub fn by(mut self, causer_id: Option<Uuid>) -> Self {
        self.causer_id = causer_id;
        self
    }

    pub fn with_properties(mut self, properties: Value) -> Self {
        self.properties = properties;
        self
    }

    /// Human-readable description, e.g. `stock transfer approved`
    pub fn description(&self) -> String {
        let subject = match self.subject {
            DocumentKind::StockAdjustment => "stock adjustment",
            DocumentKind::StockTransfer => "stock transfer",
        };
        format!("{} {}", subject, self.event.as_str().replace('_', " "))
    }
}

/// A persisted activity log row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: i64,
    pub subject_type: String,
    pub subject_id: i64,
    pub event: ActivityEvent,
    pub description: String,
    pub causer_id: Option<Uuid>,
    pub properties: Value,
    pub created_at: DateTime<Utc>,
}

/// `{ "old": [...], "attributes": [...] }` when the detail lines changed
pub fn detail_diff(old: &[DetailSnapshot], new: &[DetailSnapshot]) -> Option<Value> {
    if old == new {
        None
    } else {
        Some(json!({ "old": old, "attributes": new }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn line(product_id: i64, qty: i64) -> DetailSnapshot {
        DetailSnapshot {
            product_id,
            qty: Decimal::from(qty),
            unit_id: 1,
            batch: None,
        }
    }

    #[test]
    fn test_detail_diff_unchanged() {
        let lines = vec![line(1, 5), line(2, 3)];
        assert!(detail_diff(&lines, &lines.clone()).is_none());
    }

    #[test]
    fn test_detail_diff_changed() {
        let diff = detail_diff(&[line(1, 5)], &[line(1, 6)]).unwrap();
        assert_eq!(diff["old"][0]["product_id"], 1);
        assert_eq!(diff["attributes"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_event_description() {
        let event = DomainEvent::new(DocumentKind::StockTransfer, 4, ActivityEvent::ChildrenUpdated);
        assert_eq!(event.description(), "stock transfer children updated");
        assert_eq!("unapproved".parse::<ActivityEvent>().unwrap(), ActivityEvent::Unapproved);
    }
}
