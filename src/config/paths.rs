//! Path management for audit-stash
//!
//! ## Path Resolution Order
//!
//! 1. `AUDIT_STASH_DIR` environment variable (if set)
//! 2. The platform config directory for `audit-stash`
//!    (`~/.config/audit-stash` on Linux)

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use crate::error::AuditError;

/// Environment variable overriding the base directory
pub const DIR_ENV_VAR: &str = "AUDIT_STASH_DIR";

/// Manages all paths used by audit-stash
#[derive(Debug, Clone)]
pub struct AuditPaths {
    /// Base directory for settings and the default audit log
    base_dir: PathBuf,
}

impl AuditPaths {
    /// Resolve the base directory from the environment or platform defaults
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, AuditError> {
        let base_dir = match std::env::var_os(DIR_ENV_VAR) {
            Some(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => ProjectDirs::from("", "", "audit-stash")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or_else(|| {
                    AuditError::Config("Could not determine a configuration directory".into())
                })?,
        };

        Ok(Self { base_dir })
    }

    /// Create AuditPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path to the JSON settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Path to the YAML settings file, used when no JSON file exists
    pub fn settings_file_yaml(&self) -> PathBuf {
        self.base_dir.join("config.yaml")
    }

    /// Default path of the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Resolve a configured path relative to the base directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> Result<(), AuditError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| AuditError::Io(format!("Failed to create base directory: {}", e)))
    }

    /// Whether a settings file has been written
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists() || self.settings_file_yaml().exists()
    }
}
