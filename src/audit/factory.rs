//! Audit event construction
//!
//! Turns a lifecycle notification into the matching audit event, applying
//! the source's field policy. Updates that touch no tracked field produce
//! no event.

use super::diff::{build_diff, build_snapshot};
use super::event::{AuditEvent, EventType};
use super::filter::{FieldPolicy, TrackedFields};
use super::record::{FieldMap, RecordContext};

/// Builds audit events for one source
///
/// Holds only read-only configuration, so one factory can serve concurrent
/// saves of the same source.
#[derive(Debug, Clone, Default)]
pub struct AuditEventFactory {
    policy: FieldPolicy,
    schema: Option<Vec<String>>,
    meta: FieldMap,
}

impl AuditEventFactory {
    /// Create a factory with the given field policy and no known schema
    pub fn new(policy: FieldPolicy) -> Self {
        Self {
            policy,
            schema: None,
            meta: FieldMap::new(),
        }
    }

    /// Set the schema columns used when no explicit whitelist applies
    pub fn with_schema<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Attach metadata copied into every event this factory builds
    pub fn with_meta(mut self, meta: FieldMap) -> Self {
        self.meta = meta;
        self
    }

    pub fn policy(&self) -> &FieldPolicy {
        &self.policy
    }

    pub fn schema(&self) -> Option<&[String]> {
        self.schema.as_deref()
    }

    /// Fields tracked for a record carrying `fields`
    pub fn tracked_fields(&self, fields: &FieldMap) -> TrackedFields {
        self.policy
            .select_fields(fields.keys(), self.schema.as_deref())
    }

    /// Build the event for a newly created record
    pub fn on_create(&self, context: &RecordContext, fields: &FieldMap) -> AuditEvent {
        self.snapshot_event(EventType::Create, context, fields)
    }

    /// Build the event for a deleted record
    pub fn on_delete(&self, context: &RecordContext, fields: &FieldMap) -> AuditEvent {
        self.snapshot_event(EventType::Delete, context, fields)
    }

    /// Build the event for an updated record
    ///
    /// Returns `None` when no tracked field differs between `original` and
    /// `current`; such a save has nothing to audit.
    pub fn on_update(
        &self,
        context: &RecordContext,
        original: &FieldMap,
        current: &FieldMap,
    ) -> Option<AuditEvent> {
        let tracked = self.tracked_fields(current);
        let (changed, before) = build_diff(original, current, &tracked);

        if changed.is_empty() {
            return None;
        }

        Some(AuditEvent::new(
            EventType::Update,
            context,
            changed,
            before,
            self.meta.clone(),
        ))
    }

    fn snapshot_event(
        &self,
        event_type: EventType,
        context: &RecordContext,
        fields: &FieldMap,
    ) -> AuditEvent {
        let tracked = self.tracked_fields(fields);
        let snapshot = build_snapshot(fields, &tracked);

        AuditEvent::new(
            event_type,
            context,
            snapshot.clone(),
            snapshot,
            self.meta.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::filter::Whitelist;
    use crate::audit::record::{SourceName, TransactionId};
    use serde_json::{json, Value};

    fn map(value: Value) -> FieldMap {
        value.as_object().cloned().unwrap()
    }

    fn article() -> FieldMap {
        map(json!({
            "id": 13,
            "title": "The Title",
            "body": "The Body",
            "author_id": 1,
            "something_extra": true,
        }))
    }

    fn context() -> RecordContext {
        RecordContext::new(
            TransactionId::generate(),
            13i64,
            SourceName::new("articles").unwrap(),
        )
    }

    fn whitelisted(blacklist: &[&str]) -> AuditEventFactory {
        let policy = FieldPolicy::new(
            Whitelist::fields(["id", "title", "body", "author_id"]),
            blacklist.iter().map(|f| f.to_string()).collect(),
        )
        .unwrap();
        AuditEventFactory::new(policy)
    }

    #[test]
    fn test_create_with_whitelist() {
        let event = whitelisted(&[]).on_create(&context(), &article());

        assert_eq!(event.event_type(), EventType::Create);
        assert_eq!(event.changed(), event.original());
        assert_eq!(
            Value::Object(event.changed().clone()),
            json!({"id": 13, "title": "The Title", "body": "The Body", "author_id": 1})
        );
        assert_eq!(event.id().as_value(), &json!(13));
        assert_eq!(event.source_name().as_str(), "articles");
    }

    #[test]
    fn test_update_with_whitelist() {
        let mut current = article();
        current.insert("title".into(), json!("Another Title"));

        let event = whitelisted(&[])
            .on_update(&context(), &article(), &current)
            .unwrap();

        assert_eq!(event.event_type(), EventType::Update);
        assert_eq!(Value::Object(event.changed().clone()), json!({"title": "Another Title"}));
        assert_eq!(Value::Object(event.original().clone()), json!({"title": "The Title"}));
    }

    #[test]
    fn test_create_with_blacklist() {
        let event = whitelisted(&["author_id"]).on_create(&context(), &article());

        assert_eq!(event.changed(), event.original());
        assert_eq!(
            Value::Object(event.changed().clone()),
            json!({"id": 13, "title": "The Title", "body": "The Body"})
        );
    }

    #[test]
    fn test_update_touching_only_blacklisted_field_yields_nothing() {
        let original = map(json!({"id": 13, "title": "The Title", "body": "The Body", "author_id": 1}));
        let mut current = original.clone();
        current.insert("author_id".into(), json!(50));

        let event = whitelisted(&["author_id"]).on_update(&context(), &original, &current);
        assert!(event.is_none());
    }

    #[test]
    fn test_update_touching_only_untracked_field_yields_nothing() {
        let mut current = article();
        current.insert("something_extra".into(), json!(false));

        assert!(whitelisted(&[])
            .on_update(&context(), &article(), &current)
            .is_none());
    }

    #[test]
    fn test_create_with_fields_from_schema() {
        let policy = FieldPolicy::new(Whitelist::UseSchema, Vec::new()).unwrap();
        let factory = AuditEventFactory::new(policy).with_schema(["id", "title", "body"]);

        let event = factory.on_create(&context(), &article());
        assert_eq!(event.event_type(), EventType::Create);
        assert_eq!(
            Value::Object(event.changed().clone()),
            json!({"id": 13, "title": "The Title", "body": "The Body"})
        );
    }

    #[test]
    fn test_delete_snapshot() {
        let event = whitelisted(&[]).on_delete(&context(), &article());

        assert_eq!(event.event_type(), EventType::Delete);
        assert_eq!(event.changed(), event.original());
        assert!(!event.changed().contains_key("something_extra"));
    }

    #[test]
    fn test_update_never_reports_unchanged_fields() {
        let original = map(json!({"id": 1, "a": 1, "b": "x", "c": [1, 2]}));
        let current = map(json!({"id": 1, "a": 2, "b": "x", "c": [1, 2, 3]}));

        let factory = AuditEventFactory::new(FieldPolicy::new(Whitelist::Unset, Vec::new()).unwrap());
        let event = factory.on_update(&context(), &original, &current).unwrap();

        for (key, value) in event.changed() {
            assert_ne!(Some(value), original.get(key));
            assert_eq!(event.original().get(key), original.get(key));
        }
        assert_eq!(event.changed().len(), 2);
    }

    #[test]
    fn test_update_adding_null_field_yields_nothing() {
        let original = map(json!({"id": 1}));
        let current = map(json!({"id": 1, "note": null}));

        let factory = AuditEventFactory::new(FieldPolicy::new(Whitelist::Unset, Vec::new()).unwrap());
        assert!(factory.on_update(&context(), &original, &current).is_none());
    }

    #[test]
    fn test_context_and_meta_are_carried() {
        let ctx = context()
            .with_parent(SourceName::new("authors").unwrap())
            .with_display_value("The Title");
        let factory = whitelisted(&[]).with_meta(map(json!({"user": "ann"})));

        let event = factory.on_create(&ctx, &article());
        assert_eq!(event.transaction_id(), &ctx.transaction_id);
        assert_eq!(event.parent_source_name().map(|s| s.as_str()), Some("authors"));
        assert_eq!(event.display_value(), Some("The Title"));
        assert_eq!(event.meta()["user"], json!("ann"));
    }
}
