//! YAML Export functionality
//!
//! Exports audit events to YAML for human review.

use crate::audit::AuditEvent;
use crate::error::{AuditError, AuditResult};
use crate::export::json::AuditExport;
use std::io::Write;

/// Export events to YAML, preceded by a comment header
pub fn export_yaml<W: Write>(events: Vec<AuditEvent>, writer: &mut W) -> AuditResult<()> {
    let export = AuditExport::new(events);

    writeln!(writer, "# audit-stash export").map_err(|e| AuditError::Export(e.to_string()))?;
    writeln!(writer, "# Generated: {}", export.exported_at)
        .map_err(|e| AuditError::Export(e.to_string()))?;
    writeln!(writer, "# Events: {}", export.metadata.event_count)
        .map_err(|e| AuditError::Export(e.to_string()))?;
    writeln!(writer).map_err(|e| AuditError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, &export).map_err(|e| AuditError::Export(e.to_string()))
}
