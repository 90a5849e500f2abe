//! Desired-state model supplied by the orchestrator
//!
//! Field names follow the external-dns JSON shape so change sets can be
//! passed through unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One desired DNS name + type with its ordered target values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Fully-qualified DNS name (e.g. "www.example.com")
    pub dns_name: String,

    /// Ordered target values (record contents)
    #[serde(default)]
    pub targets: Vec<String>,

    /// Record type (e.g. "A", "TXT")
    pub record_type: String,

    /// Time-to-live in seconds; 0 means not configured
    #[serde(rename = "recordTTL", default)]
    pub record_ttl: u32,
}

impl Endpoint {
    /// Create an endpoint without a configured TTL
    pub fn new<T, S>(dns_name: impl Into<String>, record_type: impl Into<String>, targets: T) -> Self
    where
        T: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dns_name: dns_name.into(),
            targets: targets.into_iter().map(Into::into).collect(),
            record_type: record_type.into(),
            record_ttl: 0,
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.record_ttl = ttl;
        self
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} [{}]",
            self.dns_name,
            self.record_ttl,
            self.record_type,
            self.targets.join(";")
        )
    }
}

/// A batch of desired changes for one reconciliation pass
///
/// `update_old[i]` pairs with `update_new[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeSet {
    /// Endpoints to create
    #[serde(default)]
    pub create: Vec<Endpoint>,

    /// Current state of endpoints being updated
    #[serde(default)]
    pub update_old: Vec<Endpoint>,

    /// Desired state of endpoints being updated
    #[serde(default)]
    pub update_new: Vec<Endpoint>,

    /// Endpoints to delete
    #[serde(default)]
    pub delete: Vec<Endpoint>,
}

impl ChangeSet {
    /// True when any list carries an entry
    pub fn has_changes(&self) -> bool {
        !(self.create.is_empty()
            && self.update_old.is_empty()
            && self.update_new.is_empty()
            && self.delete.is_empty())
    }

    /// Total number of entries across all lists
    pub fn len(&self) -> usize {
        self.create.len() + self.update_old.len() + self.update_new.len() + self.delete.len()
    }

    /// True when there is nothing to apply
    pub fn is_empty(&self) -> bool {
        !self.has_changes()
    }

    /// Load a change set from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
