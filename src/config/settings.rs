//! Settings for audit-stash
//!
//! Holds the field policy of every tracked source, the default policy for
//! everything else, static event metadata and the audit log location.
//!
//! ```yaml
//! log_file: audit.log
//! default:
//!   whitelist: false
//! sources:
//!   articles:
//!     whitelist: [id, title, body, author_id]
//!     blacklist: [author_id]
//!   comments:
//!     schema: [id, article_id, body]
//! meta:
//!   app: blog
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::paths::AuditPaths;
use crate::audit::{AuditEventFactory, FieldMap, FieldPolicy, Whitelist, DEFAULT_BLACKLIST};
use crate::error::{AuditError, AuditResult};

/// Field tracking configuration for one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSettings {
    /// Absent, `false` (use schema) or a list of fields
    #[serde(default, skip_serializing_if = "Whitelist::is_unset")]
    pub whitelist: Whitelist,

    /// Fields never tracked
    #[serde(default = "default_blacklist")]
    pub blacklist: Vec<String>,

    /// Schema columns, used when no explicit whitelist applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Vec<String>>,
}

fn default_blacklist() -> Vec<String> {
    DEFAULT_BLACKLIST.iter().map(|f| f.to_string()).collect()
}

fn default_schema_version() -> u32 {
    1
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            whitelist: Whitelist::Unset,
            blacklist: default_blacklist(),
            schema: None,
        }
    }
}

impl SourceSettings {
    /// Validate into a field policy
    pub fn to_policy(&self) -> AuditResult<FieldPolicy> {
        FieldPolicy::new(self.whitelist.clone(), self.blacklist.clone())
    }

    /// Build the event factory for this source
    pub fn to_factory(&self) -> AuditResult<AuditEventFactory> {
        let factory = AuditEventFactory::new(self.to_policy()?);
        Ok(match &self.schema {
            Some(schema) => factory.with_schema(schema.iter().cloned()),
            None => factory,
        })
    }
}

/// Settings for audit-stash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Audit log path; relative paths are resolved against the base directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// Policy for sources without their own entry
    #[serde(default)]
    pub default: SourceSettings,

    /// Per-source policies keyed by source name
    #[serde(default)]
    pub sources: BTreeMap<String, SourceSettings>,

    /// Metadata attached to every event
    #[serde(default, skip_serializing_if = "FieldMap::is_empty")]
    pub meta: FieldMap,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            log_file: None,
            default: SourceSettings::default(),
            sources: BTreeMap::new(),
            meta: FieldMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or return defaults if no settings file exists
    ///
    /// `config.json` takes precedence over `config.yaml`.
    pub fn load_or_create(paths: &AuditPaths) -> AuditResult<Self> {
        let json_path = paths.settings_file();
        if json_path.exists() {
            return Self::load_from(&json_path);
        }

        let yaml_path = paths.settings_file_yaml();
        if yaml_path.exists() {
            return Self::load_from(&yaml_path);
        }

        // Don't save yet - let caller decide when to persist
        Ok(Settings::default())
    }

    /// Load settings from a JSON or YAML file, chosen by extension
    pub fn load_from(path: &Path) -> AuditResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AuditError::Io(format!("Failed to read settings file {}: {}", path.display(), e))
        })?;

        let settings: Settings = if is_yaml(path) {
            serde_yaml::from_str(&contents).map_err(|e| {
                AuditError::Config(format!("Failed to parse settings file: {}", e))
            })?
        } else {
            serde_json::from_str(&contents).map_err(|e| {
                AuditError::Config(format!("Failed to parse settings file: {}", e))
            })?
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to `config.json`
    pub fn save(&self, paths: &AuditPaths) -> AuditResult<()> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| AuditError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| AuditError::Io(format!("Failed to write settings file: {}", e)))
    }

    /// Check every configured policy
    pub fn validate(&self) -> AuditResult<()> {
        self.default.to_policy()?;
        for (name, source) in &self.sources {
            if name.trim().is_empty() {
                return Err(AuditError::Config("source name must not be empty".into()));
            }
            source
                .to_policy()
                .map_err(|e| AuditError::Config(format!("source '{}': {}", name, e)))?;
        }
        Ok(())
    }

    /// Factory for sources without their own entry
    pub fn default_factory(&self) -> AuditResult<AuditEventFactory> {
        Ok(self.default.to_factory()?.with_meta(self.meta.clone()))
    }

    /// Factory for a named source, falling back to the default policy
    pub fn factory_for(&self, source: &str) -> AuditResult<AuditEventFactory> {
        match self.sources.get(source) {
            Some(settings) => Ok(settings.to_factory()?.with_meta(self.meta.clone())),
            None => self.default_factory(),
        }
    }

    /// Where the audit log lives
    pub fn audit_log_path(&self, paths: &AuditPaths) -> PathBuf {
        match &self.log_file {
            Some(file) => paths.resolve(file),
            None => paths.audit_log(),
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}
