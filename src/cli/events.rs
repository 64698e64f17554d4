//! Log inspection and diff preview commands

use clap::Args;
use std::path::{Path, PathBuf};

use crate::audit::{
    AuditEvent, FieldMap, JsonlPersister, RecordContext, RecordId, SourceName, TransactionId,
};
use crate::config::{AuditPaths, Settings};
use crate::display::{format_event_details, format_event_list};
use crate::error::{AuditError, AuditResult};

/// Arguments for `log`
#[derive(Args, Debug)]
pub struct LogArgs {
    /// Show only the most recent N events
    #[arg(short, long)]
    pub recent: Option<usize>,

    /// Show every event in full, with nested changes
    #[arg(short, long)]
    pub detailed: bool,

    /// Only events for this source
    #[arg(short, long)]
    pub source: Option<String>,
}

/// Arguments for `diff`
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// JSON object with the record before the save
    pub before: PathBuf,

    /// JSON object with the record after the save
    pub after: PathBuf,

    /// Source whose field policy applies
    #[arg(short, long)]
    pub source: String,

    /// Primary key to show in the preview
    #[arg(long, default_value = "preview")]
    pub id: String,

    /// Print the event projection as JSON
    #[arg(long)]
    pub json: bool,
}

/// Handle the log command
pub fn handle_log_command(paths: &AuditPaths, settings: &Settings, args: LogArgs) -> AuditResult<()> {
    let persister = JsonlPersister::new(settings.audit_log_path(paths));

    let mut events = match args.recent {
        Some(count) => persister.read_recent(count)?,
        None => persister.read_all()?,
    };

    if let Some(source) = &args.source {
        events.retain(|event| event.source_name().as_str() == source);
    }

    if events.is_empty() {
        println!("No audit events found.");
    } else if args.detailed {
        for event in &events {
            println!("{}", format_event_details(event, true));
        }
    } else {
        print!("{}", format_event_list(&events));
    }

    Ok(())
}

/// Handle the count command
pub fn handle_count_command(paths: &AuditPaths, settings: &Settings) -> AuditResult<()> {
    let persister = JsonlPersister::new(settings.audit_log_path(paths));
    println!("{}", persister.entry_count()?);
    Ok(())
}

/// Handle the diff command
///
/// Builds the update event a save would produce under the source's policy
/// without writing anything.
pub fn handle_diff_command(settings: &Settings, args: DiffArgs) -> AuditResult<()> {
    match preview_update(settings, &args)? {
        Some(event) if args.json => {
            let projection = event.to_projection()?;
            let output = serde_json::to_string_pretty(&projection)
                .map_err(|e| AuditError::Json(e.to_string()))?;
            println!("{}", output);
        }
        Some(event) => println!("{}", format_event_details(&event, true)),
        None => println!("No tracked fields changed."),
    }

    Ok(())
}

fn preview_update(settings: &Settings, args: &DiffArgs) -> AuditResult<Option<AuditEvent>> {
    let original = read_field_map(&args.before)?;
    let current = read_field_map(&args.after)?;

    let factory = settings.factory_for(&args.source)?;
    let context = RecordContext::new(
        TransactionId::generate(),
        RecordId::from(args.id.as_str()),
        SourceName::new(args.source.as_str())?,
    );

    Ok(factory.on_update(&context, &original, &current))
}

/// Read a JSON object from disk
fn read_field_map(path: &Path) -> AuditResult<FieldMap> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| AuditError::Io(format!("Failed to read {}: {}", path.display(), e)))?;

    let value: serde_json::Value = serde_json::from_str(&contents)?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(AuditError::Json(format!(
            "{} does not contain a JSON object",
            path.display()
        ))),
    }
}
