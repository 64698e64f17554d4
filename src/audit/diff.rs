//! Diff computation for audit events
//!
//! Builds the `changed`/`original` field maps of an audit event from the
//! record's field values and the set of tracked fields, and renders
//! human-readable summaries of those maps.
//!
//! Two values are considered equal when they are structurally equal as JSON:
//! `"1"` differs from `1`, and `1` differs from `1.0`.

use serde_json::Value;

use super::filter::TrackedFields;
use super::record::FieldMap;

/// Snapshot of the tracked fields of a record
///
/// Used for both `changed` and `original` of create and delete events.
/// Preserves the record's field order.
pub fn build_snapshot(fields: &FieldMap, tracked: &TrackedFields) -> FieldMap {
    fields
        .iter()
        .filter(|(key, _)| tracked.contains(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Compute the `(changed, original)` maps of an update
///
/// A tracked field appears in both maps when its current value differs from
/// its original value. A field absent from `original` counts as changed and
/// is recorded there as `null`, so an absent field that is now `null` is not
/// a change. Output follows the field order of `current`.
pub fn build_diff(
    original: &FieldMap,
    current: &FieldMap,
    tracked: &TrackedFields,
) -> (FieldMap, FieldMap) {
    let mut changed = FieldMap::new();
    let mut before = FieldMap::new();

    for (key, current_val) in current {
        if !tracked.contains(key) {
            continue;
        }

        match original.get(key) {
            Some(original_val) if original_val == current_val => {}
            Some(original_val) => {
                changed.insert(key.clone(), current_val.clone());
                before.insert(key.clone(), original_val.clone());
            }
            None if current_val.is_null() => {}
            None => {
                changed.insert(key.clone(), current_val.clone());
                before.insert(key.clone(), Value::Null);
            }
        }
    }

    (changed, before)
}

/// One-line summary of the fields that differ between two maps
///
/// Lists modified fields first (in `after` order), then fields that only
/// exist on one side. Returns `None` when nothing differs.
pub fn summarize_changes(before: &FieldMap, after: &FieldMap) -> Option<String> {
    let mut changes = Vec::new();

    for (key, after_val) in after {
        match before.get(key) {
            Some(before_val) if before_val == after_val => {}
            Some(before_val) => changes.push(format!(
                "{}: {} -> {}",
                key,
                format_value(before_val),
                format_value(after_val)
            )),
            None => changes.push(format!("{}: (added) -> {}", key, format_value(after_val))),
        }
    }

    for (key, before_val) in before {
        if !after.contains_key(key) {
            changes.push(format!("{}: {} -> (removed)", key, format_value(before_val)));
        }
    }

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

/// Per-field change lines, recursing into nested objects and arrays
///
/// Nested paths are dotted (`author.name`), array items indexed
/// (`tags[1]`).
pub fn describe_changes_nested(before: &FieldMap, after: &FieldMap) -> Vec<String> {
    let mut changes = Vec::new();

    for (key, after_val) in after {
        match before.get(key) {
            Some(before_val) => describe_value(before_val, after_val, key, &mut changes),
            None => changes.push(format!("{}: (added) -> {}", key, format_value(after_val))),
        }
    }

    for (key, before_val) in before {
        if !after.contains_key(key) {
            changes.push(format!("{}: {} -> (removed)", key, format_value(before_val)));
        }
    }

    changes
}

fn describe_value(before: &Value, after: &Value, path: &str, changes: &mut Vec<String>) {
    if before == after {
        return;
    }

    match (before, after) {
        (Value::Object(before_obj), Value::Object(after_obj)) => {
            for (key, after_val) in after_obj {
                let child = format!("{}.{}", path, key);
                match before_obj.get(key) {
                    Some(before_val) => describe_value(before_val, after_val, &child, changes),
                    None => changes.push(format!("{}: (added) -> {}", child, format_value(after_val))),
                }
            }
            for (key, before_val) in before_obj {
                if !after_obj.contains_key(key) {
                    changes.push(format!(
                        "{}.{}: {} -> (removed)",
                        path,
                        key,
                        format_value(before_val)
                    ));
                }
            }
        }
        (Value::Array(before_arr), Value::Array(after_arr))
            if before_arr.len() == after_arr.len() =>
        {
            for (i, (b, a)) in before_arr.iter().zip(after_arr).enumerate() {
                describe_value(b, a, &format!("{}[{}]", path, i), changes);
            }
        }
        _ => changes.push(format!(
            "{}: {} -> {}",
            path,
            format_value(before),
            format_value(after)
        )),
    }
}

/// Format a JSON value for human-readable display
pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            // Truncate long strings
            if s.chars().count() > 50 {
                let head: String = s.chars().take(47).collect();
                format!("\"{}...\"", head)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> FieldMap {
        match value {
            Value::Object(obj) => obj,
            other => panic!("expected object, got {}", other),
        }
    }

    fn tracked(fields: &[&str]) -> TrackedFields {
        fields.iter().copied().collect()
    }

    #[test]
    fn test_snapshot_keeps_tracked_fields_in_record_order() {
        let fields = map(json!({"title": "T", "extra": true, "id": 13, "body": "B"}));
        let snapshot = build_snapshot(&fields, &tracked(&["id", "title", "body"]));

        let keys: Vec<&str> = snapshot.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["title", "id", "body"]);
        assert!(!snapshot.contains_key("extra"));
    }

    #[test]
    fn test_snapshot_ignores_missing_whitelisted_fields() {
        let fields = map(json!({"id": 1}));
        let snapshot = build_snapshot(&fields, &tracked(&["id", "nope"]));
        assert_eq!(Value::Object(snapshot), json!({"id": 1}));
    }

    #[test]
    fn test_diff_only_changed_fields() {
        let original = map(json!({"id": 13, "title": "T", "body": "B"}));
        let current = map(json!({"id": 13, "title": "T2", "body": "B"}));

        let (changed, before) = build_diff(&original, &current, &tracked(&["id", "title", "body"]));
        assert_eq!(Value::Object(changed), json!({"title": "T2"}));
        assert_eq!(Value::Object(before), json!({"title": "T"}));
    }

    #[test]
    fn test_diff_skips_untracked_changes() {
        let original = map(json!({"title": "T", "author_id": 1}));
        let current = map(json!({"title": "T", "author_id": 50}));

        let (changed, before) = build_diff(&original, &current, &tracked(&["title"]));
        assert!(changed.is_empty());
        assert!(before.is_empty());
    }

    #[test]
    fn test_diff_missing_original_counts_as_changed() {
        let original = map(json!({"id": 1}));
        let current = map(json!({"id": 1, "title": "New"}));

        let (changed, before) = build_diff(&original, &current, &tracked(&["id", "title"]));
        assert_eq!(Value::Object(changed), json!({"title": "New"}));
        assert_eq!(Value::Object(before), json!({"title": null}));
    }

    #[test]
    fn test_diff_missing_original_and_null_current_is_unchanged() {
        let original = map(json!({}));
        let current = map(json!({"note": null}));

        let (changed, before) = build_diff(&original, &current, &tracked(&["note"]));
        assert!(changed.is_empty());
        assert!(before.is_empty());
    }

    #[test]
    fn test_diff_is_type_aware() {
        let original = map(json!({"a": "1", "b": 1, "c": 1}));
        let current = map(json!({"a": 1, "b": 1.0, "c": 1}));

        let (changed, _) = build_diff(&original, &current, &tracked(&["a", "b", "c"]));
        let keys: Vec<&str> = changed.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_diff_compares_nested_values_deeply() {
        let original = map(json!({"tags": ["a", "b"], "meta": {"x": 1}}));
        let current = map(json!({"tags": ["a", "b"], "meta": {"x": 2}}));

        let (changed, _) = build_diff(&original, &current, &tracked(&["tags", "meta"]));
        assert_eq!(Value::Object(changed), json!({"meta": {"x": 2}}));
    }

    #[test]
    fn test_diff_follows_current_order() {
        let original = map(json!({"a": 1, "b": 1, "c": 1}));
        let current = map(json!({"c": 2, "a": 2, "b": 2}));

        let (changed, before) = build_diff(&original, &current, &tracked(&["a", "b", "c"]));
        let changed_keys: Vec<&str> = changed.keys().map(String::as_str).collect();
        let before_keys: Vec<&str> = before.keys().map(String::as_str).collect();
        assert_eq!(changed_keys, vec!["c", "a", "b"]);
        assert_eq!(changed_keys, before_keys);
    }

    #[test]
    fn test_summary_of_update() {
        let before = map(json!({"title": "Old", "count": 1}));
        let after = map(json!({"title": "New", "count": 1}));

        let summary = summarize_changes(&before, &after).unwrap();
        assert_eq!(summary, "title: \"Old\" -> \"New\"");
    }

    #[test]
    fn test_summary_added_and_removed() {
        let before = map(json!({"old": "value"}));
        let after = map(json!({"new": 100}));

        let summary = summarize_changes(&before, &after).unwrap();
        assert!(summary.contains("new: (added) -> 100"));
        assert!(summary.contains("old: \"value\" -> (removed)"));
    }

    #[test]
    fn test_summary_none_when_equal() {
        let fields = map(json!({"a": 1}));
        assert!(summarize_changes(&fields, &fields).is_none());
    }

    #[test]
    fn test_nested_description() {
        let before = map(json!({"author": {"name": "Ann", "age": 30}, "tags": ["x", "y"]}));
        let after = map(json!({"author": {"name": "Bob", "age": 30}, "tags": ["x", "z"]}));

        let changes = describe_changes_nested(&before, &after);
        assert_eq!(
            changes,
            vec![
                "author.name: \"Ann\" -> \"Bob\"".to_string(),
                "tags[1]: \"y\" -> \"z\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_long_string_truncation() {
        let long = "a".repeat(100);
        let formatted = format_value(&json!(long));
        assert!(formatted.ends_with("...\""));
        assert_eq!(formatted.len(), 47 + 5);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!(null)), "null");
        assert_eq!(format_value(&json!(true)), "true");
        assert_eq!(format_value(&json!(42)), "42");
        assert_eq!(format_value(&json!("test")), "\"test\"");
        assert_eq!(format_value(&json!([1, 2, 3])), "[3 items]");
        assert_eq!(format_value(&json!({"a": 1, "b": 2})), "{2 fields}");
    }
}
