//! audit-stash - Audit logging for record lifecycle events
//!
//! This library turns create, update and delete notifications from a
//! persistence layer into immutable audit events. Each event records which
//! fields changed, their values before and after, and the transaction that
//! caused them, then goes to a pluggable persister.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `audit`: Field selection, diffing, events, factories, persisters and lifecycle hooks
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `export`: JSON, YAML and CSV export of a persisted log
//! - `display`: Terminal formatting of events
//! - `cli`: Command handlers for the `audit-stash` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use audit_stash::audit::{AuditTracker, JsonlPersister};
//! use audit_stash::config::{AuditPaths, Settings};
//!
//! let paths = AuditPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let tracker = AuditTracker::from_settings(
//!     &settings,
//!     JsonlPersister::new(settings.audit_log_path(&paths)),
//! )?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;

pub use error::{AuditError, AuditResult};
