use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use audit_stash::cli::{
    handle_config_command, handle_count_command, handle_diff_command, handle_export_command,
    handle_init_command, handle_log_command, handle_record_command, handle_verify_command,
    DiffArgs, ExportArgs, LogArgs, RecordArgs,
};
use audit_stash::config::{AuditPaths, Settings};

#[derive(Parser)]
#[command(
    name = "audit-stash",
    version,
    about = "Audit logging for record lifecycle events",
    long_about = "audit-stash turns create, update and delete notifications into \
                  immutable audit events that record what changed, the values \
                  before and after, and the transaction that caused it."
)]
struct Cli {
    /// Settings file to use instead of the one in the base directory
    #[arg(long, global = true, env = "AUDIT_STASH_CONFIG")]
    config: Option<PathBuf>,

    /// Base directory for settings and the audit log
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record lifecycle notifications read as JSON lines
    Record(RecordArgs),

    /// Preview the update event for a before/after pair of records
    Diff(DiffArgs),

    /// Show the audit log
    Log(LogArgs),

    /// Count events in the audit log
    Count,

    /// Export the audit log
    Export(ExportArgs),

    /// Check a JSON export file
    Verify {
        /// Path to the export file
        file: PathBuf,
    },

    /// Write default settings to the base directory
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Initialize paths and settings
    let paths = match cli.data_dir {
        Some(dir) => AuditPaths::with_base_dir(dir),
        None => AuditPaths::new()?,
    };
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load_or_create(&paths)?,
    };

    match cli.command {
        Commands::Record(args) => handle_record_command(&paths, &settings, args)?,
        Commands::Diff(args) => handle_diff_command(&settings, args)?,
        Commands::Log(args) => handle_log_command(&paths, &settings, args)?,
        Commands::Count => handle_count_command(&paths, &settings)?,
        Commands::Export(args) => handle_export_command(&paths, &settings, args)?,
        Commands::Verify { file } => handle_verify_command(&file)?,
        Commands::Init => handle_init_command(&paths, &settings)?,
        Commands::Config => handle_config_command(&paths, &settings)?,
    }

    Ok(())
}
