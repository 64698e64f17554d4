//! Audit event display formatting
//!
//! Formats audit events for terminal output in table and detail views.

use crate::audit::{AuditEvent, EventType};

/// Format a list of events as a table
pub fn format_event_list(events: &[AuditEvent]) -> String {
    if events.is_empty() {
        return "No audit events found.".to_string();
    }

    let source_width = events
        .iter()
        .map(|e| e.source_name().as_str().chars().count())
        .max()
        .unwrap_or(6)
        .max(6);

    let key_width = events
        .iter()
        .map(|e| e.id().to_string().chars().count())
        .max()
        .unwrap_or(3)
        .max(3);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<19}  {:<6}  {:<source_width$}  {:<key_width$}  {}\n",
        "Time",
        "Type",
        "Source",
        "Key",
        "Fields",
        source_width = source_width,
        key_width = key_width,
    ));

    output.push_str(&format!(
        "{:-<19}  {:-<6}  {:-<source_width$}  {:-<key_width$}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        source_width = source_width,
        key_width = key_width,
    ));

    for event in events {
        let fields: Vec<&str> = event.changed().keys().map(String::as_str).collect();

        output.push_str(&format!(
            "{:<19}  {:<6}  {:<source_width$}  {:<key_width$}  {}\n",
            event.timestamp().format("%Y-%m-%d %H:%M:%S").to_string(),
            event.event_type().to_string(),
            event.source_name().as_str(),
            event.id().to_string(),
            fields.join(", "),
            source_width = source_width,
            key_width = key_width,
        ));
    }

    output.push_str(&format!("\nTotal: {} event(s)\n", events.len()));
    output
}

/// Format one event with every tracked field
///
/// With `detailed`, update events list nested changes as dotted paths
/// instead of whole top-level values.
pub fn format_event_details(event: &AuditEvent, detailed: bool) -> String {
    let mut output = String::new();

    output.push_str(&format!("{} {}\n", event.event_type(), event.source_name()));
    output.push_str(&format!("  Key:          {}\n", event.id()));
    output.push_str(&format!("  Transaction:  {}\n", event.transaction_id()));
    output.push_str(&format!(
        "  Time:         {}\n",
        event.timestamp().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if let Some(parent) = event.parent_source_name() {
        output.push_str(&format!("  Via:          {}\n", parent));
    }
    if let Some(label) = event.display_value() {
        output.push_str(&format!("  Label:        {}\n", label));
    }

    match event.event_type() {
        EventType::Update if detailed => {
            output.push_str("  Changes:\n");
            for line in event.detailed_changes() {
                output.push_str(&format!("    {}\n", line));
            }
        }
        EventType::Update => {
            output.push_str("  Changes:\n");
            for (field, after) in event.changed() {
                let before = event
                    .original()
                    .get(field)
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "null".to_string());
                output.push_str(&format!("    {}: {} -> {}\n", field, before, after));
            }
        }
        EventType::Create | EventType::Delete => {
            output.push_str("  Fields:\n");
            for (field, value) in event.changed() {
                output.push_str(&format!("    {}: {}\n", field, value));
            }
        }
    }

    if !event.meta().is_empty() {
        output.push_str("  Meta:\n");
        for (key, value) in event.meta() {
            output.push_str(&format!("    {}: {}\n", key, value));
        }
    }

    output
}
