//! Field selection for audit tracking
//!
//! Decides which fields of a record are tracked, from an optional whitelist,
//! the source's schema columns and a blacklist.
//!
//! Resolution order:
//!
//! 1. A non-empty explicit whitelist is used as-is (schema is ignored).
//! 2. Otherwise the schema fields are used when known, else every field the
//!    record carries.
//! 3. Blacklisted fields are removed from the result of (1) or (2).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{AuditError, AuditResult};

/// Fields excluded when no blacklist is configured
///
/// These are timestamps the host maintains on every save, so auditing them
/// would turn every update into a change.
pub const DEFAULT_BLACKLIST: &[&str] = &["created", "modified"];

/// Whitelist setting for a tracked source
///
/// In a settings file the whitelist is either absent (`Unset`), `false`
/// (`UseSchema`) or a list of field names (`Explicit`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WhitelistSetting", into = "WhitelistSetting")]
pub enum Whitelist {
    /// No whitelist configured; falls back to the schema like `UseSchema`
    #[default]
    Unset,
    /// Track the source's schema columns (or all fields if no schema is known)
    UseSchema,
    /// Track exactly these fields
    Explicit(Vec<String>),
}

impl Whitelist {
    /// Build an explicit whitelist from field names
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Explicit(fields.into_iter().map(Into::into).collect())
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// The explicit field list, if one is in effect
    fn explicit(&self) -> Option<&[String]> {
        match self {
            Self::Explicit(fields) if !fields.is_empty() => Some(fields.as_slice()),
            _ => None,
        }
    }
}

/// On-disk form of [`Whitelist`]
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WhitelistSetting {
    Flag(bool),
    Fields(Vec<String>),
}

impl From<WhitelistSetting> for Whitelist {
    fn from(setting: WhitelistSetting) -> Self {
        match setting {
            WhitelistSetting::Flag(false) => Whitelist::UseSchema,
            WhitelistSetting::Flag(true) => Whitelist::Unset,
            WhitelistSetting::Fields(fields) if fields.is_empty() => Whitelist::Unset,
            WhitelistSetting::Fields(fields) => Whitelist::Explicit(fields),
        }
    }
}

impl From<Whitelist> for WhitelistSetting {
    fn from(whitelist: Whitelist) -> Self {
        match whitelist {
            Whitelist::Unset => WhitelistSetting::Flag(true),
            Whitelist::UseSchema => WhitelistSetting::Flag(false),
            Whitelist::Explicit(fields) => WhitelistSetting::Fields(fields),
        }
    }
}

/// The effective set of fields to track for one record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedFields(BTreeSet<String>);

impl TrackedFields {
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate field names in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for TrackedFields {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Compute the effective set of tracked fields
///
/// `all_fields` is every field the record carries; `schema_fields` the
/// columns known for the source, if any. An empty schema counts as unknown.
/// Whitelisted fields the record does not carry are kept here and simply
/// never match at diff time.
pub fn select_fields<I, S>(
    all_fields: I,
    schema_fields: Option<&[String]>,
    whitelist: &Whitelist,
    blacklist: &[String],
) -> TrackedFields
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let base: BTreeSet<String> = match (whitelist.explicit(), schema_fields) {
        (Some(fields), _) => fields.iter().cloned().collect(),
        (None, Some(schema)) if !schema.is_empty() => schema.iter().cloned().collect(),
        (None, _) => all_fields
            .into_iter()
            .map(|field| field.as_ref().to_string())
            .collect(),
    };

    TrackedFields(
        base.into_iter()
            .filter(|field| !blacklist.contains(field))
            .collect(),
    )
}

/// Validated whitelist/blacklist configuration for one source
///
/// Read-only once built, so it can be shared across concurrent saves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPolicy {
    whitelist: Whitelist,
    blacklist: Vec<String>,
}

impl Default for FieldPolicy {
    fn default() -> Self {
        Self {
            whitelist: Whitelist::Unset,
            blacklist: DEFAULT_BLACKLIST.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl FieldPolicy {
    /// Create a policy, rejecting contradictory or malformed settings
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Config` if a field name is blank, or if every
    /// field of an explicit whitelist is also blacklisted.
    pub fn new(whitelist: Whitelist, blacklist: Vec<String>) -> AuditResult<Self> {
        if let Whitelist::Explicit(fields) = &whitelist {
            if fields.iter().any(|f| f.trim().is_empty()) {
                return Err(AuditError::Config(
                    "whitelist contains a blank field name".into(),
                ));
            }
        }

        if blacklist.iter().any(|f| f.trim().is_empty()) {
            return Err(AuditError::Config(
                "blacklist contains a blank field name".into(),
            ));
        }

        if let Some(fields) = whitelist.explicit() {
            if fields.iter().all(|f| blacklist.contains(f)) {
                return Err(AuditError::Config(format!(
                    "every whitelisted field is also blacklisted: {}",
                    fields.join(", ")
                )));
            }
        }

        Ok(Self {
            whitelist,
            blacklist,
        })
    }

    /// Policy tracking exactly the given fields, with no blacklist
    pub fn whitelist_only<I, S>(fields: I) -> AuditResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Whitelist::fields(fields), Vec::new())
    }

    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    pub fn blacklist(&self) -> &[String] {
        &self.blacklist
    }

    /// Apply this policy to a record's fields
    pub fn select_fields<I, S>(&self, all_fields: I, schema_fields: Option<&[String]>) -> TrackedFields
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        select_fields(all_fields, schema_fields, &self.whitelist, &self.blacklist)
    }
}
