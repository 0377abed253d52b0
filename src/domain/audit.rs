use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::card::Operation;

/// Maximum number of events the audit log keeps.
pub const AUDIT_CAPACITY: usize = 50;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    BlockAllRequested,
    UnblockAllRequested,
    CardBlocked,
    CardUnblocked,
    RequestFailed,
    RequestCompleted,
}

impl AuditEventType {
    pub fn requested(op: Operation) -> Self {
        match op {
            Operation::Block => AuditEventType::BlockAllRequested,
            Operation::Unblock => AuditEventType::UnblockAllRequested,
        }
    }

    pub fn card_changed(op: Operation) -> Self {
        match op {
            Operation::Block => AuditEventType::CardBlocked,
            Operation::Unblock => AuditEventType::CardUnblocked,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditSource {
    #[default]
    Web,
}

/// An event as handed to the log; id and timestamp are assigned on append.
#[derive(Debug, PartialEq, Clone)]
pub struct NewAuditEvent {
    pub event_type: AuditEventType,
    pub source: AuditSource,
    pub message: String,
    pub meta: Option<Map<String, Value>>,
}

impl NewAuditEvent {
    pub fn new(event_type: AuditEventType, message: impl Into<String>) -> Self {
        Self {
            event_type,
            source: AuditSource::Web,
            message: message.into(),
            meta: None,
        }
    }

    /// Attaches metadata. Values that do not serialize to a JSON object are
    /// stored under a single `value` key.
    pub fn with_meta<T: Serialize>(mut self, meta: &T) -> Self {
        self.meta = match serde_json::to_value(meta) {
            Ok(Value::Object(map)) => Some(map),
            Ok(other) => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                Some(map)
            }
            Err(e) => {
                tracing::warn!(error = %e, "dropping audit metadata that failed to serialize");
                None
            }
        };
        self
    }
}

/// A finalized, immutable audit record.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct AuditEvent {
    pub id: String,
    pub ts: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: AuditEventType,
    pub source: AuditSource,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub meta: Option<Map<String, Value>>,
}

impl AuditEvent {
    pub fn finalize(event: NewAuditEvent, id: String, ts: DateTime<Utc>) -> Self {
        Self {
            id,
            ts,
            event_type: event.event_type,
            source: event.source,
            message: event.message,
            meta: event.meta,
        }
    }
}
