// # Registrar Trait
//
// Defines the interface to a session-based DNS registrar.
//
// ## Implementations
//
// - INWX: `recsync-registrar-inwx` crate
// - In-memory: `recsync_core::registrar::MemoryRegistrar`
//
// ## Usage
//
// ```rust,ignore
// use recsync_core::Registrar;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let registrar = /* Registrar implementation */;
//
//     registrar.login().await?;
//     for zone in registrar.zones().await? {
//         println!("{zone}: {} records", registrar.records(&zone).await?.len());
//     }
//     registrar.logout().await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque registrar-assigned record identifier
///
/// Registrars may use strings or integers; both are carried as text and never
/// ordered or parsed by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create an identifier from any token
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// A record currently stored at the registrar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// Registrar-assigned identifier
    pub id: RecordId,
    /// Name relative to the zone; empty for the apex
    pub name: String,
    /// Record type (e.g. "A", "TXT")
    pub record_type: String,
    /// Record value
    pub content: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Priority (MX/SRV); 0 otherwise
    pub priority: u32,
}

/// Payload for creating or updating a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRequest {
    /// Zone that owns the record
    pub zone: String,
    /// Name relative to the zone; empty for the apex
    pub name: String,
    /// Record type
    pub record_type: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Record value
    pub content: String,
    /// Priority (MX/SRV); 0 otherwise
    pub priority: u32,
}

/// What the registrar reports about an established session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Customer identifier
    pub customer_id: Option<u64>,
    /// Account identifier
    pub account_id: Option<u64>,
    /// Registrar API version
    pub version: Option<String>,
}

/// Trait for registrar implementations
///
/// A registrar holds zones and their records behind a login session. The
/// engine opens exactly one session per pass and calls the record operations
/// sequentially inside it.
///
/// # Constraints
///
/// - No retries: a failed call returns its error and the engine records it
/// - No caching beyond a single call
/// - `records` must exclude deleted records
/// - `create_record` reports an already present record with
///   [`Error::object_exists`](crate::Error::object_exists)
/// - `update_record`/`delete_record` on an unknown or deleted id report
///   [`Error::object_missing`](crate::Error::object_missing)
#[async_trait]
pub trait Registrar: Send + Sync {
    /// Open a session
    async fn login(&self) -> Result<SessionInfo, crate::Error>;

    /// Close the current session
    async fn logout(&self) -> Result<(), crate::Error>;

    /// List the names of all zones visible to the account
    async fn zones(&self) -> Result<Vec<String>, crate::Error>;

    /// List the live records of a zone
    async fn records(&self, zone: &str) -> Result<Vec<RemoteRecord>, crate::Error>;

    /// Create a record
    async fn create_record(&self, request: &RecordRequest) -> Result<(), crate::Error>;

    /// Replace the record `id` with `request`, keeping its identifier
    async fn update_record(&self, id: &RecordId, request: &RecordRequest)
    -> Result<(), crate::Error>;

    /// Delete the record `id`
    async fn delete_record(&self, id: &RecordId) -> Result<(), crate::Error>;

    /// Registrar name (for logging/debugging)
    fn registrar_name(&self) -> &'static str;
}

/// Helper trait for constructing registrars from configuration
pub trait RegistrarFactory: Send + Sync {
    /// Create a Registrar instance from configuration
    fn create(
        &self,
        config: &crate::config::RegistrarConfig,
    ) -> Result<Box<dyn Registrar>, crate::Error>;
}
