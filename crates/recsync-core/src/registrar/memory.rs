// # Memory Registrar
//
// In-memory implementation of Registrar.
//
// ## Purpose
//
// A deterministic registrar for tests and dry runs. It follows the same
// contract as a real registrar:
//
// - Operations other than login fail outside a session
// - Deleted records are tombstoned and filtered from listings, so a second
//   delete of the same identifier fails with "object does not exist"
// - Creating a live duplicate (name, type, content) fails with "object exists"
// - Identifiers are assigned from one counter across all zones
//
// ## Storage
//
// Each zone keeps its records in insertion order; an identifier → zone index
// resolves updates and deletes that only carry an identifier.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::RegistrarConfig;
use crate::traits::registrar::{
    RecordId, RecordRequest, Registrar, RegistrarFactory, RemoteRecord, SessionInfo,
};

#[derive(Debug, Clone)]
struct StoredRecord {
    record: RemoteRecord,
    deleted: bool,
}

#[derive(Debug, Default)]
struct MemoryDb {
    zones: BTreeMap<String, Vec<StoredRecord>>,
    id_to_zone: HashMap<RecordId, String>,
    next_id: u64,
    session_active: bool,
    calls: CallCounts,
}

impl MemoryDb {
    fn require_session(&self) -> Result<(), Error> {
        if self.session_active {
            Ok(())
        } else {
            Err(Error::auth("no active session"))
        }
    }

    fn live_record_mut(&mut self, id: &RecordId) -> Result<&mut StoredRecord, Error> {
        let zone = self
            .id_to_zone
            .get(id)
            .ok_or_else(|| Error::object_missing(format!("record ID {} not found", id)))?;
        let stored = self
            .zones
            .get_mut(zone)
            .and_then(|records| records.iter_mut().find(|r| &r.record.id == id))
            .ok_or_else(|| Error::object_missing(format!("record ID {} not found", id)))?;
        if stored.deleted {
            return Err(Error::object_missing(format!(
                "record ID {} has already been deleted",
                id
            )));
        }
        Ok(stored)
    }
}

/// Number of calls per registrar operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `login` calls
    pub login: usize,
    /// `logout` calls
    pub logout: usize,
    /// `zones` calls
    pub zones: usize,
    /// `records` calls
    pub records: usize,
    /// `create_record` calls
    pub create: usize,
    /// `update_record` calls
    pub update: usize,
    /// `delete_record` calls
    pub delete: usize,
}

impl CallCounts {
    /// Total number of calls
    pub fn total(&self) -> usize {
        self.login
            + self.logout
            + self.zones
            + self.records
            + self.create
            + self.update
            + self.delete
    }
}

/// In-memory registrar implementation
///
/// Clones share the same storage, so a test can keep a handle while the
/// engine owns another.
///
/// # Example
///
/// ```rust,no_run
/// use recsync_core::registrar::MemoryRegistrar;
/// use recsync_core::Registrar;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let registrar = MemoryRegistrar::with_zones(["example.com"]);
///     registrar.seed_record("example.com", "www", "A", "1.2.3.4", 300).await?;
///
///     registrar.login().await?;
///     let records = registrar.records("example.com").await?;
///     assert_eq!(records.len(), 1);
///     registrar.logout().await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistrar {
    inner: Arc<RwLock<MemoryDb>>,
}

impl MemoryRegistrar {
    /// Create a registrar without zones
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registrar holding the given empty zones
    pub fn with_zones<I, S>(zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let db = MemoryDb {
            zones: zones
                .into_iter()
                .map(|z| (z.into(), Vec::new()))
                .collect(),
            ..Default::default()
        };
        Self {
            inner: Arc::new(RwLock::new(db)),
        }
    }

    /// Add an empty zone
    pub async fn create_zone(&self, zone: impl Into<String>) -> Result<(), Error> {
        let zone = zone.into();
        let mut guard = self.inner.write().await;
        if guard.zones.contains_key(&zone) {
            return Err(Error::object_exists(format!("zone {} already exists", zone)));
        }
        guard.zones.insert(zone, Vec::new());
        Ok(())
    }

    /// Insert a record directly, bypassing sessions and call counters
    pub async fn seed_record(
        &self,
        zone: &str,
        name: &str,
        record_type: &str,
        content: &str,
        ttl: u32,
    ) -> Result<RecordId, Error> {
        let mut guard = self.inner.write().await;
        insert(
            &mut guard,
            &RecordRequest {
                zone: zone.to_string(),
                name: name.to_string(),
                record_type: record_type.to_string(),
                ttl,
                content: content.to_string(),
                priority: 0,
            },
        )
    }

    /// Live records of a zone, bypassing sessions and call counters
    pub async fn snapshot(&self, zone: &str) -> Vec<RemoteRecord> {
        let guard = self.inner.read().await;
        guard
            .zones
            .get(zone)
            .map(|records| live(records))
            .unwrap_or_default()
    }

    /// Calls received so far
    pub async fn calls(&self) -> CallCounts {
        self.inner.read().await.calls
    }

    /// True while a session is open
    pub async fn session_active(&self) -> bool {
        self.inner.read().await.session_active
    }
}

fn live(records: &[StoredRecord]) -> Vec<RemoteRecord> {
    records
        .iter()
        .filter(|r| !r.deleted)
        .map(|r| r.record.clone())
        .collect()
}

fn insert(db: &mut MemoryDb, request: &RecordRequest) -> Result<RecordId, Error> {
    let id = RecordId::from(db.next_id);
    let records = db
        .zones
        .get_mut(&request.zone)
        .ok_or_else(|| Error::object_missing(format!("zone {} not found", request.zone)))?;

    check_unique(records, None, request)?;

    records.push(StoredRecord {
        record: to_record(id.clone(), request),
        deleted: false,
    });
    db.id_to_zone.insert(id.clone(), request.zone.clone());
    db.next_id += 1;
    Ok(id)
}

/// Fails when a live record other than `except` already holds the
/// (name, type, content) of `request`
fn check_unique(
    records: &[StoredRecord],
    except: Option<&RecordId>,
    request: &RecordRequest,
) -> Result<(), Error> {
    let duplicate = records.iter().any(|r| {
        !r.deleted
            && Some(&r.record.id) != except
            && r.record.name == request.name
            && r.record.record_type == request.record_type
            && r.record.content == request.content
    });
    if duplicate {
        return Err(Error::object_exists(format!(
            "record {} {} {} already exists in zone {}",
            request.name, request.record_type, request.content, request.zone
        )));
    }
    Ok(())
}

fn to_record(id: RecordId, request: &RecordRequest) -> RemoteRecord {
    RemoteRecord {
        id,
        name: request.name.clone(),
        record_type: request.record_type.clone(),
        content: request.content.clone(),
        ttl: request.ttl,
        priority: request.priority,
    }
}

#[async_trait]
impl Registrar for MemoryRegistrar {
    async fn login(&self) -> Result<SessionInfo, Error> {
        let mut guard = self.inner.write().await;
        guard.calls.login += 1;
        guard.session_active = true;
        Ok(SessionInfo {
            customer_id: Some(1000),
            account_id: Some(1000),
            version: Some("memory".to_string()),
        })
    }

    async fn logout(&self) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.calls.logout += 1;
        guard.require_session()?;
        guard.session_active = false;
        Ok(())
    }

    async fn zones(&self) -> Result<Vec<String>, Error> {
        let mut guard = self.inner.write().await;
        guard.calls.zones += 1;
        guard.require_session()?;
        Ok(guard.zones.keys().cloned().collect())
    }

    async fn records(&self, zone: &str) -> Result<Vec<RemoteRecord>, Error> {
        let mut guard = self.inner.write().await;
        guard.calls.records += 1;
        guard.require_session()?;
        guard
            .zones
            .get(zone)
            .map(|records| live(records))
            .ok_or_else(|| Error::object_missing(format!("zone {} not found", zone)))
    }

    async fn create_record(&self, request: &RecordRequest) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.calls.create += 1;
        guard.require_session()?;
        insert(&mut guard, request).map(|_| ())
    }

    async fn update_record(&self, id: &RecordId, request: &RecordRequest) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.calls.update += 1;
        guard.require_session()?;
        guard.live_record_mut(id)?;
        if let Some(records) = guard
            .id_to_zone
            .get(id)
            .and_then(|zone| guard.zones.get(zone))
        {
            check_unique(records, Some(id), request)?;
        }
        let stored = guard.live_record_mut(id)?;
        stored.record = to_record(id.clone(), request);
        Ok(())
    }

    async fn delete_record(&self, id: &RecordId) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.calls.delete += 1;
        guard.require_session()?;
        guard.live_record_mut(id)?.deleted = true;
        Ok(())
    }

    fn registrar_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for creating memory registrars
pub struct MemoryRegistrarFactory;

impl RegistrarFactory for MemoryRegistrarFactory {
    fn create(&self, config: &RegistrarConfig) -> Result<Box<dyn Registrar>, Error> {
        match config {
            RegistrarConfig::Memory { zones } => {
                tracing::warn!(
                    "Memory registrar selected - changes are not sent to any registrar"
                );
                Ok(Box::new(MemoryRegistrar::with_zones(zones.iter().cloned())))
            }
            _ => Err(Error::config("Invalid config for memory registrar")),
        }
    }
}
