//! CLI commands for audit log export
//!
//! Writes the persisted audit log to a file or stdout in JSON, YAML or CSV.

use clap::{Args, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::audit::{AuditEvent, JsonlPersister};
use crate::config::{AuditPaths, Settings};
use crate::error::{AuditError, AuditResult};
use crate::export::{csv, json, yaml};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// JSON with schema version and event counts
    Json,
    /// YAML, human-readable
    Yaml,
    /// CSV, one row per event
    Csv,
}

/// Arguments for `export`
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Export format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: ExportFormat,

    /// Output file path (writes to stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Handle the export command
pub fn handle_export_command(
    paths: &AuditPaths,
    settings: &Settings,
    args: ExportArgs,
) -> AuditResult<()> {
    let persister = JsonlPersister::new(settings.audit_log_path(paths));
    let events = persister.read_all()?;
    let count = events.len();

    match &args.output {
        Some(output) => {
            let file = File::create(output).map_err(|e| {
                AuditError::Export(format!("Failed to create file {}: {}", output.display(), e))
            })?;
            let mut writer = BufWriter::new(file);
            write_events(events, &mut writer, args.format, args.pretty)?;
            writer
                .flush()
                .map_err(|e| AuditError::Export(e.to_string()))?;
            println!("Exported {} event(s) to: {}", count, output.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            write_events(events, &mut writer, args.format, args.pretty)?;
        }
    }

    Ok(())
}

/// Handle the verify command
///
/// Reads a JSON export back and reports what it holds.
pub fn handle_verify_command(file: &Path) -> AuditResult<()> {
    let contents = std::fs::read_to_string(file)
        .map_err(|e| AuditError::Io(format!("Failed to read {}: {}", file.display(), e)))?;
    let export = json::import_from_json(&contents)?;

    println!("Export file: {}", file.display());
    println!("  Schema version: {}", export.schema_version);
    println!("  Exported at:    {}", export.exported_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  App version:    {}", export.app_version);
    println!("  Events:         {}", export.metadata.event_count);
    println!("    Create: {}", export.metadata.create_count);
    println!("    Update: {}", export.metadata.update_count);
    println!("    Delete: {}", export.metadata.delete_count);

    Ok(())
}

fn write_events<W: Write>(
    events: Vec<AuditEvent>,
    writer: &mut W,
    format: ExportFormat,
    pretty: bool,
) -> AuditResult<()> {
    match format {
        ExportFormat::Json => json::export_json(events, writer, pretty),
        ExportFormat::Yaml => yaml::export_yaml(events, writer),
        ExportFormat::Csv => csv::export_events_csv(&events, writer),
    }
}
