//! Record identity types
//!
//! A lifecycle notification identifies the affected record by transaction,
//! primary key and source. The string identifiers are validated newtypes so
//! that a blank transaction id or source name is rejected before any event
//! is built.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AuditError, AuditResult};

/// Ordered mapping of field name to a dynamically-typed value
///
/// Field order is the record's natural order (serde_json `preserve_order`).
pub type FieldMap = serde_json::Map<String, Value>;

/// Macro to generate non-empty string newtypes
macro_rules! define_name {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new value, rejecting blank input
            pub fn new(value: impl Into<String>) -> AuditResult<Self> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(AuditError::missing($label));
                }
                Ok(Self(value))
            }

            /// Borrow the underlying string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = AuditError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = AuditError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_name!(TransactionId, "transaction id");
define_name!(SourceName, "source name");

impl TransactionId {
    /// Generate a fresh random transaction id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Primary key of the affected record
///
/// Scalar keys hold a scalar value, composite keys an array of parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Value);

impl RecordId {
    /// Wrap any JSON-representable key
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    /// Build a composite key from its parts
    pub fn composite<I, V>(parts: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self(Value::Array(parts.into_iter().map(Into::into).collect()))
    }

    /// Get the underlying value
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Whether this key is made of several parts
    pub fn is_composite(&self) -> bool {
        self.0.is_array()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            Value::Array(parts) => {
                let rendered: Vec<String> = parts
                    .iter()
                    .map(|part| match part {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect();
                f.write_str(&rendered.join(","))
            }
            other => write!(f, "{}", other),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(Value::from(id))
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(Value::from(id))
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(Value::from(id))
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(Value::from(id))
    }
}

impl From<Uuid> for RecordId {
    fn from(id: Uuid) -> Self {
        Self(Value::from(id.to_string()))
    }
}

/// Identifying data shared by every lifecycle notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordContext {
    /// Groups the events of one logical save operation
    #[serde(rename = "transaction")]
    pub transaction_id: TransactionId,

    /// Primary key of the affected record
    #[serde(rename = "primary_key")]
    pub id: RecordId,

    /// Collection the record belongs to
    #[serde(rename = "source")]
    pub source: SourceName,

    /// Collection whose save cascaded into this one
    #[serde(default, rename = "parent_source", skip_serializing_if = "Option::is_none")]
    pub parent_source: Option<SourceName>,

    /// Human-readable label for the record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_value: Option<String>,
}

impl RecordContext {
    pub fn new(transaction_id: TransactionId, id: impl Into<RecordId>, source: SourceName) -> Self {
        Self {
            transaction_id,
            id: id.into(),
            source,
            parent_source: None,
            display_value: None,
        }
    }

    /// Mark this record as saved through a cascade from `parent`
    pub fn with_parent(mut self, parent: SourceName) -> Self {
        self.parent_source = Some(parent);
        self
    }

    pub fn with_display_value(mut self, display_value: impl Into<String>) -> Self {
        self.display_value = Some(display_value.into());
        self
    }
}
