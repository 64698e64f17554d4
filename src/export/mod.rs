//! Export module for audit-stash
//!
//! Exports a persisted audit log in multiple formats:
//! - CSV: one row per event (spreadsheet-compatible)
//! - JSON: machine-readable export with schema versioning
//! - YAML: human-readable export

pub mod csv;
pub mod json;
pub mod yaml;

pub use csv::export_events_csv;
pub use json::{export_json, import_from_json, AuditExport, EXPORT_SCHEMA_VERSION};
pub use yaml::export_yaml;
