//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the audit core.

pub mod config;
pub mod events;
pub mod export;
pub mod record;

pub use config::{handle_config_command, handle_init_command};
pub use events::{handle_count_command, handle_diff_command, handle_log_command, DiffArgs, LogArgs};
pub use export::{handle_export_command, handle_verify_command, ExportArgs, ExportFormat};
pub use record::{handle_record_command, record_notifications, RecordArgs, RecordSummary, Sink};
