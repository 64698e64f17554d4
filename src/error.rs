//! Custom error types for audit-stash
//!
//! This module defines the error hierarchy for the crate using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for audit-stash operations
#[derive(Error, Debug)]
pub enum AuditError {
    /// Invalid whitelist/blacklist or settings file contents
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required identifying field was missing or blank
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// Failure reported by a persister (I/O, serialization, transport)
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A stored or deserialized event does not satisfy the event invariants
    #[error("Invalid audit event: {0}")]
    InvalidEvent(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),
}

impl AuditError {
    /// Create a precondition error for a blank required field
    pub fn missing(field: &str) -> Self {
        Self::Precondition(format!("{} must not be empty", field))
    }

    /// Check if this error came from a persister
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }

    /// Check if this is a precondition violation
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<std::io::Error> for AuditError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for audit-stash operations
pub type AuditResult<T> = Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuditError::Config("whitelist entry is blank".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: whitelist entry is blank"
        );
    }

    #[test]
    fn test_missing_field_error() {
        let err = AuditError::missing("transaction id");
        assert_eq!(
            err.to_string(),
            "Precondition violated: transaction id must not be empty"
        );
        assert!(err.is_precondition());
        assert!(!err.is_persistence());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let audit_err: AuditError = io_err.into();
        assert!(matches!(audit_err, AuditError::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let audit_err: AuditError = json_err.into();
        assert!(matches!(audit_err, AuditError::Json(_)));
    }
}
