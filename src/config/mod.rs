//! Configuration module for audit-stash
//!
//! This module provides configuration management including:
//! - Base directory resolution
//! - Per-source field tracking policies
//! - Audit log location

pub mod paths;
pub mod settings;

pub use paths::AuditPaths;
pub use settings::{Settings, SourceSettings};
