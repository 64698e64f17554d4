//! JSON Export functionality
//!
//! Exports audit events to JSON with schema versioning.

use crate::audit::{AuditEvent, EventType};
use crate::error::{AuditError, AuditResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Full audit log export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    /// Export timestamp
    pub exported_at: DateTime<Utc>,

    /// Version of audit-stash that created the export
    pub app_version: String,

    /// Event counts by type
    pub metadata: ExportMetadata,

    /// Exported events, oldest first
    pub events: Vec<AuditEvent>,
}

/// Export metadata for reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub event_count: usize,
    pub create_count: usize,
    pub update_count: usize,
    pub delete_count: usize,
}

impl AuditExport {
    /// Wrap events for export
    pub fn new(events: Vec<AuditEvent>) -> Self {
        let mut metadata = ExportMetadata {
            event_count: events.len(),
            ..ExportMetadata::default()
        };
        for event in &events {
            match event.event_type() {
                EventType::Create => metadata.create_count += 1,
                EventType::Update => metadata.update_count += 1,
                EventType::Delete => metadata.delete_count += 1,
            }
        }

        Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            metadata,
            events,
        }
    }

    /// Check the export is readable by this version
    pub fn validate(&self) -> Result<(), String> {
        let major = self.schema_version.split('.').next().unwrap_or_default();
        if major != "1" {
            return Err(format!(
                "Unsupported export schema version: {}",
                self.schema_version
            ));
        }

        if self.metadata.event_count != self.events.len() {
            return Err(format!(
                "Export claims {} events but contains {}",
                self.metadata.event_count,
                self.events.len()
            ));
        }

        Ok(())
    }
}

/// Export events to JSON
pub fn export_json<W: Write>(events: Vec<AuditEvent>, writer: &mut W, pretty: bool) -> AuditResult<()> {
    let export = AuditExport::new(events);

    let result = if pretty {
        serde_json::to_writer_pretty(&mut *writer, &export)
    } else {
        serde_json::to_writer(&mut *writer, &export)
    };
    result.map_err(|e| AuditError::Export(e.to_string()))?;

    writeln!(writer).map_err(|e| AuditError::Export(e.to_string()))
}

/// Read a JSON export back
pub fn import_from_json(json_str: &str) -> AuditResult<AuditExport> {
    let export: AuditExport =
        serde_json::from_str(json_str).map_err(|e| AuditError::Export(e.to_string()))?;

    export.validate().map_err(AuditError::Export)?;

    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditEventFactory, FieldMap, RecordContext, SourceName, TransactionId};
    use serde_json::json;

    fn events() -> Vec<AuditEvent> {
        let factory = AuditEventFactory::default();
        let context = RecordContext::new(
            TransactionId::new("txn-1").unwrap(),
            1i64,
            SourceName::new("articles").unwrap(),
        );
        let before: FieldMap = json!({"title": "A"}).as_object().cloned().unwrap();
        let after: FieldMap = json!({"title": "B"}).as_object().cloned().unwrap();

        vec![
            factory.on_create(&context, &before),
            factory.on_update(&context, &before, &after).unwrap(),
            factory.on_delete(&context, &after),
        ]
    }

    #[test]
    fn test_export_metadata_counts() {
        let export = AuditExport::new(events());
        assert_eq!(
            export.metadata,
            ExportMetadata {
                event_count: 3,
                create_count: 1,
                update_count: 1,
                delete_count: 1,
            }
        );
    }

    #[test]
    fn test_export_and_import() {
        let original = events();
        let mut buffer = Vec::new();
        export_json(original.clone(), &mut buffer, true).unwrap();

        let imported = import_from_json(&String::from_utf8(buffer).unwrap()).unwrap();
        assert_eq!(imported.schema_version, EXPORT_SCHEMA_VERSION);
        assert_eq!(imported.events, original);
    }

    #[test]
    fn test_import_rejects_no_op_update() {
        let export = AuditExport::new(events());
        let mut value = serde_json::to_value(&export).unwrap();
        value["events"][1]["original"] = json!({"title": "B"});

        let err = import_from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, AuditError::Export(_)));
        assert!(err.to_string().contains("unchanged field"));
    }

    #[test]
    fn test_import_rejects_future_schema() {
        let mut export = AuditExport::new(events());
        export.schema_version = "2.0.0".into();
        let json = serde_json::to_string(&export).unwrap();

        assert!(matches!(import_from_json(&json), Err(AuditError::Export(_))));
    }
}
