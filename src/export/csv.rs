//! CSV Export functionality
//!
//! One row per event; `changed`, `original` and `meta` are embedded as JSON.

use crate::audit::AuditEvent;
use crate::error::{AuditError, AuditResult};
use std::io::Write;

const HEADER: [&str; 10] = [
    "Timestamp",
    "Type",
    "Transaction",
    "Source",
    "Parent Source",
    "Primary Key",
    "Display Value",
    "Changed",
    "Original",
    "Meta",
];

/// Export events to CSV
pub fn export_events_csv<W: Write>(events: &[AuditEvent], writer: W) -> AuditResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record(HEADER)
        .map_err(|e| AuditError::Export(e.to_string()))?;

    for event in events {
        let changed = serde_json::to_string(event.changed())?;
        let original = serde_json::to_string(event.original())?;
        let meta = serde_json::to_string(event.meta())?;

        csv_writer
            .write_record([
                event.timestamp().to_rfc3339(),
                event.event_type().as_str().to_string(),
                event.transaction_id().to_string(),
                event.source_name().to_string(),
                event
                    .parent_source_name()
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                event.id().to_string(),
                event.display_value().unwrap_or_default().to_string(),
                changed,
                original,
                meta,
            ])
            .map_err(|e| AuditError::Export(e.to_string()))?;
    }

    csv_writer
        .flush()
        .map_err(|e| AuditError::Export(e.to_string()))
}
