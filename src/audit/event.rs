//! Audit event data structures
//!
//! Defines the immutable audit event handed to persisters, its event type
//! and its serialized projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::diff::{describe_changes_nested, summarize_changes};
use super::record::{FieldMap, RecordContext, RecordId, SourceName, TransactionId};
use crate::error::{AuditError, AuditResult};

/// Kind of lifecycle change an event records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Record was created
    Create,
    /// Record was updated
    Update,
    /// Record was deleted
    Delete,
}

impl EventType {
    /// Name used in the serialized projection
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Create => "create",
            EventType::Update => "update",
            EventType::Delete => "delete",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Create => write!(f, "CREATE"),
            EventType::Update => write!(f, "UPDATE"),
            EventType::Delete => write!(f, "DELETE"),
        }
    }
}

/// A single audit event
///
/// Built only by [`AuditEventFactory`](super::AuditEventFactory); every
/// field is read through an accessor. For create and delete events
/// `changed` and `original` hold the same snapshot. For updates they share
/// one key set and every key holds differing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAuditEvent")]
pub struct AuditEvent {
    #[serde(rename = "type")]
    event_type: EventType,

    #[serde(rename = "transaction")]
    transaction_id: TransactionId,

    #[serde(rename = "primary_key")]
    id: RecordId,

    #[serde(rename = "source")]
    source_name: SourceName,

    #[serde(rename = "parent_source")]
    parent_source_name: Option<SourceName>,

    original: FieldMap,

    changed: FieldMap,

    display_value: Option<String>,

    /// Host-supplied metadata (acting user, request id, ...)
    #[serde(default, skip_serializing_if = "FieldMap::is_empty")]
    meta: FieldMap,

    #[serde(rename = "@timestamp")]
    timestamp: DateTime<Utc>,
}

/// Wire shape of an event, checked before it becomes an `AuditEvent`
#[derive(Deserialize)]
struct RawAuditEvent {
    #[serde(rename = "type")]
    event_type: EventType,
    #[serde(rename = "transaction")]
    transaction_id: TransactionId,
    #[serde(rename = "primary_key")]
    id: RecordId,
    #[serde(rename = "source")]
    source_name: SourceName,
    #[serde(default, rename = "parent_source")]
    parent_source_name: Option<SourceName>,
    original: FieldMap,
    changed: FieldMap,
    #[serde(default)]
    display_value: Option<String>,
    #[serde(default)]
    meta: FieldMap,
    #[serde(rename = "@timestamp")]
    timestamp: DateTime<Utc>,
}

impl TryFrom<RawAuditEvent> for AuditEvent {
    type Error = AuditError;

    fn try_from(raw: RawAuditEvent) -> Result<Self, Self::Error> {
        let event = Self {
            event_type: raw.event_type,
            transaction_id: raw.transaction_id,
            id: raw.id,
            source_name: raw.source_name,
            parent_source_name: raw.parent_source_name,
            original: raw.original,
            changed: raw.changed,
            display_value: raw.display_value,
            meta: raw.meta,
            timestamp: raw.timestamp,
        };
        event.check_invariants()?;
        Ok(event)
    }
}

impl AuditEvent {
    pub(crate) fn new(
        event_type: EventType,
        context: &RecordContext,
        changed: FieldMap,
        original: FieldMap,
        meta: FieldMap,
    ) -> Self {
        Self {
            event_type,
            transaction_id: context.transaction_id.clone(),
            id: context.id.clone(),
            source_name: context.source.clone(),
            parent_source_name: context.parent_source.clone(),
            original,
            changed,
            display_value: context.display_value.clone(),
            meta,
            timestamp: Utc::now(),
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    /// Primary key of the affected record
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn source_name(&self) -> &SourceName {
        &self.source_name
    }

    /// Source whose save cascaded into this change, if any
    pub fn parent_source_name(&self) -> Option<&SourceName> {
        self.parent_source_name.as_ref()
    }

    /// Tracked fields in their "after" state
    pub fn changed(&self) -> &FieldMap {
        &self.changed
    }

    /// Tracked fields in their "before" state
    pub fn original(&self) -> &FieldMap {
        &self.original
    }

    pub fn display_value(&self) -> Option<&str> {
        self.display_value.as_deref()
    }

    pub fn meta(&self) -> &FieldMap {
        &self.meta
    }

    /// When the event was built (UTC)
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Serialize the event into a JSON mapping keyed by field name
    pub fn to_projection(&self) -> AuditResult<Value> {
        serde_json::to_value(self)
            .map_err(|e| AuditError::Json(format!("Failed to project audit event: {}", e)))
    }

    /// Rebuild an event from its projection
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Json` if the mapping is malformed, or
    /// `AuditError::InvalidEvent` if it breaks the event invariants.
    pub fn from_projection(projection: Value) -> AuditResult<Self> {
        let raw: RawAuditEvent = serde_json::from_value(projection)
            .map_err(|e| AuditError::Json(format!("Failed to read audit event: {}", e)))?;
        Self::try_from(raw)
    }

    fn check_invariants(&self) -> AuditResult<()> {
        match self.event_type {
            EventType::Create | EventType::Delete => {
                if self.changed != self.original {
                    return Err(AuditError::InvalidEvent(format!(
                        "{} event for {} has differing changed and original fields",
                        self.event_type.as_str(),
                        self.id
                    )));
                }
            }
            EventType::Update => {
                if self.changed.is_empty() {
                    return Err(AuditError::InvalidEvent(format!(
                        "update event for {} has no changed fields",
                        self.id
                    )));
                }
                let same_keys = self.changed.len() == self.original.len()
                    && self.changed.keys().all(|k| self.original.contains_key(k));
                if !same_keys {
                    return Err(AuditError::InvalidEvent(format!(
                        "update event for {} has mismatched changed and original fields",
                        self.id
                    )));
                }
                if let Some(key) = self
                    .changed
                    .iter()
                    .find(|(k, v)| self.original.get(k.as_str()) == Some(*v))
                    .map(|(k, _)| k)
                {
                    return Err(AuditError::InvalidEvent(format!(
                        "update event for {} reports unchanged field '{}'",
                        self.id, key
                    )));
                }
            }
        }
        Ok(())
    }

    /// One-line summary of what changed, for update events
    pub fn diff_summary(&self) -> Option<String> {
        match self.event_type {
            EventType::Update => summarize_changes(&self.original, &self.changed),
            EventType::Create | EventType::Delete => None,
        }
    }

    /// Per-field change lines including nested paths, for update events
    pub fn detailed_changes(&self) -> Vec<String> {
        match self.event_type {
            EventType::Update => describe_changes_nested(&self.original, &self.changed),
            EventType::Create | EventType::Delete => Vec::new(),
        }
    }

    /// Format the event for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.event_type,
            self.source_name,
            self.id
        );

        if let Some(name) = &self.display_value {
            output.push_str(&format!(" ({})", name));
        }

        if let Some(parent) = &self.parent_source_name {
            output.push_str(&format!(" via {}", parent));
        }

        match self.diff_summary() {
            Some(diff) => output.push_str(&format!("\n  Changes: {}", diff)),
            None => {
                let fields: Vec<&str> = self.changed.keys().map(String::as_str).collect();
                if !fields.is_empty() {
                    output.push_str(&format!("\n  Fields: {}", fields.join(", ")));
                }
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> RecordContext {
        RecordContext::new(
            TransactionId::new("txn-1").unwrap(),
            13i64,
            SourceName::new("articles").unwrap(),
        )
        .with_display_value("The Title")
    }

    fn map(value: Value) -> FieldMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_event_type_display() {
        assert_eq!(EventType::Create.to_string(), "CREATE");
        assert_eq!(EventType::Update.to_string(), "UPDATE");
        assert_eq!(EventType::Delete.as_str(), "delete");
    }

    #[test]
    fn test_projection_field_names() {
        let fields = map(json!({"id": 13, "title": "T"}));
        let event = AuditEvent::new(
            EventType::Create,
            &context(),
            fields.clone(),
            fields,
            FieldMap::new(),
        );

        let projection = event.to_projection().unwrap();
        assert_eq!(projection["type"], json!("create"));
        assert_eq!(projection["transaction"], json!("txn-1"));
        assert_eq!(projection["primary_key"], json!(13));
        assert_eq!(projection["source"], json!("articles"));
        assert_eq!(projection["parent_source"], Value::Null);
        assert_eq!(projection["changed"], json!({"id": 13, "title": "T"}));
        assert_eq!(projection["display_value"], json!("The Title"));
        assert!(projection.get("meta").is_none());
        assert!(projection.get("@timestamp").is_some());
    }

    #[test]
    fn test_projection_round_trip() {
        let event = AuditEvent::new(
            EventType::Update,
            &context().with_parent(SourceName::new("authors").unwrap()),
            map(json!({"title": "T2"})),
            map(json!({"title": "T"})),
            map(json!({"user": "ann"})),
        );

        let restored = AuditEvent::from_projection(event.to_projection().unwrap()).unwrap();
        assert_eq!(restored, event);
        assert_eq!(restored.event_type(), EventType::Update);
        assert_eq!(restored.transaction_id().as_str(), "txn-1");
        assert_eq!(restored.id(), &RecordId::from(13i64));
        assert_eq!(restored.source_name().as_str(), "articles");
        assert_eq!(restored.parent_source_name().map(|s| s.as_str()), Some("authors"));
        assert_eq!(restored.changed(), &map(json!({"title": "T2"})));
        assert_eq!(restored.original(), &map(json!({"title": "T"})));
        assert_eq!(restored.display_value(), Some("The Title"));
        assert_eq!(restored.meta()["user"], json!("ann"));
    }

    #[test]
    fn test_projection_rejects_broken_invariants() {
        let mut projection = AuditEvent::new(
            EventType::Create,
            &context(),
            map(json!({"a": 1})),
            map(json!({"a": 1})),
            FieldMap::new(),
        )
        .to_projection()
        .unwrap();
        projection["original"] = json!({"a": 2});

        let err = AuditEvent::from_projection(projection).unwrap_err();
        assert!(matches!(err, AuditError::InvalidEvent(_)));
    }

    fn update_projection() -> Value {
        AuditEvent::new(
            EventType::Update,
            &context(),
            map(json!({"t": "B"})),
            map(json!({"t": "A"})),
            FieldMap::new(),
        )
        .to_projection()
        .unwrap()
    }

    #[test]
    fn test_projection_rejects_update_with_equal_values() {
        let mut projection = update_projection();
        projection["original"] = json!({"t": "B"});

        let err = AuditEvent::from_projection(projection).unwrap_err();
        assert!(matches!(err, AuditError::InvalidEvent(_)));
        assert!(err.to_string().contains("'t'"));
    }

    #[test]
    fn test_deserialize_checks_invariants() {
        let projection = update_projection();
        assert!(serde_json::from_value::<AuditEvent>(projection.clone()).is_ok());

        let mut broken = projection;
        broken["original"] = json!({"t": "B"});
        let err = serde_json::from_value::<AuditEvent>(broken).unwrap_err();
        assert!(err.to_string().contains("unchanged field"));
    }

    #[test]
    fn test_projection_rejects_blank_source() {
        let mut projection = AuditEvent::new(
            EventType::Delete,
            &context(),
            FieldMap::new(),
            FieldMap::new(),
            FieldMap::new(),
        )
        .to_projection()
        .unwrap();
        projection["source"] = json!("");

        assert!(AuditEvent::from_projection(projection).is_err());
    }

    #[test]
    fn test_human_readable_format() {
        let event = AuditEvent::new(
            EventType::Update,
            &context(),
            map(json!({"title": "T2"})),
            map(json!({"title": "T"})),
            FieldMap::new(),
        );

        let formatted = event.format_human_readable();
        assert!(formatted.contains("UPDATE articles 13 (The Title)"));
        assert!(formatted.contains("Changes: title: \"T\" -> \"T2\""));
    }

    #[test]
    fn test_create_has_no_diff_summary() {
        let fields = map(json!({"id": 13}));
        let event = AuditEvent::new(
            EventType::Create,
            &context(),
            fields.clone(),
            fields,
            FieldMap::new(),
        );

        assert!(event.diff_summary().is_none());
        assert!(event.format_human_readable().contains("Fields: id"));
    }
}
