//! Reconciliation engine
//!
//! The Reconciler is responsible for:
//! - Converging registrar records to a [`ChangeSet`] (`apply_changes`)
//! - Reading the observed records back as endpoints (`records`)
//! - Reporting the zones visible to the account at startup (`check_zones`)
//!
//! ## Pass Flow
//!
//! ```text
//! login ─▶ zones ─▶ Delete ─▶ Create ─▶ Update ─▶ logout
//!                      │         │         │
//!                      └─────────┴─────────┴──▶ errors (aggregated)
//! ```
//!
//! Each phase memoizes zone snapshots in its own [`ZoneRecordCache`]; earlier
//! phases mutate the registrar, so a snapshot never crosses phases.
//!
//! A failure concerning one endpoint or target is recorded and the pass moves
//! on. Only login and zone listing failures end a pass early.

mod cache;

use crate::config::{EngineConfig, SyncConfig};
use crate::endpoint::{ChangeSet, Endpoint};
use crate::error::{Error, Result};
use crate::filter::DomainFilter;
use crate::matcher::{find_by_name_and_type, find_exact, match_targets};
use crate::resolver::{record_name, resolve_zone};
use crate::session::Session;
use crate::traits::{RecordId, RecordRequest, Registrar};
use cache::ZoneRecordCache;
use tracing::{debug, error, info, warn};

/// Counters for one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Records created
    pub created: usize,
    /// Records updated in place
    pub updated: usize,
    /// Records deleted
    pub deleted: usize,
    /// Targets already present
    pub skipped: usize,
}

/// Mutable state threaded through the phases of one pass
#[derive(Default)]
struct Pass {
    errors: Vec<Error>,
    summary: PassSummary,
}

impl Pass {
    fn fail(&mut self, err: Error) {
        self.errors.push(err);
    }
}

/// Core reconciliation engine
///
/// The engine owns a registrar and the domain filter. Every call runs inside
/// its own registrar session; nothing is cached between calls.
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Optionally call [`Reconciler::check_zones()`] once at startup
/// 3. Call [`Reconciler::records()`] / [`Reconciler::apply_changes()`] per
///    orchestrator cycle
pub struct Reconciler {
    /// Registrar holding zones and records
    registrar: Box<dyn Registrar>,

    /// Zones this engine manages
    domain_filter: DomainFilter,

    /// Engine settings
    engine: EngineConfig,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `registrar`: Registrar implementation
    /// - `config`: Configuration (domain filter and engine settings are used)
    pub fn new(registrar: Box<dyn Registrar>, config: &SyncConfig) -> Result<Self> {
        config.engine.validate()?;

        Ok(Self {
            registrar,
            domain_filter: config.domain_filter.clone(),
            engine: config.engine.clone(),
        })
    }

    /// The domain filter in effect
    pub fn domain_filter(&self) -> &DomainFilter {
        &self.domain_filter
    }

    /// Log the zones visible to the account
    ///
    /// Failures are logged, not returned: a startup check must not prevent
    /// the engine from running.
    pub async fn check_zones(&self) -> Option<Vec<String>> {
        match Session::scoped(self.registrar.as_ref(), |s| s.registrar().zones()).await {
            Ok(zones) => {
                info!(
                    "{} zones available: {} ({})",
                    self.registrar.registrar_name(),
                    zones.len(),
                    zones.join(", ")
                );
                let unmanaged: Vec<&String> = zones
                    .iter()
                    .filter(|z| !self.domain_filter.matches(z))
                    .collect();
                if !unmanaged.is_empty() {
                    debug!("Zones excluded by domain filter: {:?}", unmanaged);
                }
                Some(zones)
            }
            Err(e) => {
                error!("Startup zone check failed: {}", e);
                None
            }
        }
    }

    /// Read every live record of the managed zones as single-target endpoints
    ///
    /// Records sharing a name and type are not merged.
    pub async fn records(&self) -> Result<Vec<Endpoint>> {
        let session = Session::open(self.registrar.as_ref()).await?;
        let result = self.read_records(session.registrar()).await;
        session.close().await;
        result
    }

    async fn read_records(&self, registrar: &dyn Registrar) -> Result<Vec<Endpoint>> {
        let zones = self.managed_zones(registrar).await?;

        let mut endpoints = Vec::new();
        for zone in &zones {
            let records = registrar.records(zone).await.map_err(|e| {
                Error::registrar(format!(
                    "unable to query DNS zone info for zone '{}': {}",
                    zone, e
                ))
            })?;
            for rec in records {
                let dns_name = if rec.name.is_empty() {
                    zone.clone()
                } else {
                    format!("{}.{}", rec.name, zone)
                };
                endpoints.push(Endpoint {
                    dns_name,
                    targets: vec![rec.content],
                    record_type: rec.record_type,
                    record_ttl: rec.ttl,
                });
            }
        }

        for endpoint in &endpoints {
            debug!("Endpoint collected: {}", endpoint);
        }
        Ok(endpoints)
    }

    /// Apply a change set in one pass
    ///
    /// Returns the pass counters on success, or [`Error::Aggregate`] when any
    /// sub-operation failed; every other sub-operation has still been
    /// attempted. An empty change set makes no registrar calls.
    pub async fn apply_changes(&self, changes: &ChangeSet) -> Result<PassSummary> {
        if !changes.has_changes() {
            debug!("No changes detected - nothing to do");
            return Ok(PassSummary::default());
        }

        let session = Session::open(self.registrar.as_ref()).await?;
        let result = self.run_pass(session.registrar(), changes).await;
        session.close().await;
        result
    }

    async fn run_pass(
        &self,
        registrar: &dyn Registrar,
        changes: &ChangeSet,
    ) -> Result<PassSummary> {
        let zones = self.managed_zones(registrar).await?;
        let mut pass = Pass::default();

        self.apply_deletes(registrar, &zones, &changes.delete, &mut pass)
            .await;
        self.apply_creates(registrar, &zones, &changes.create, &mut pass)
            .await;
        self.apply_updates(
            registrar,
            &zones,
            &changes.update_old,
            &changes.update_new,
            &mut pass,
        )
        .await;

        let PassSummary {
            created,
            updated,
            deleted,
            skipped,
        } = pass.summary;
        info!(
            "Pass complete: {} created, {} updated, {} deleted, {} skipped, {} failed",
            created,
            updated,
            deleted,
            skipped,
            pass.errors.len()
        );

        if pass.errors.is_empty() {
            Ok(pass.summary)
        } else {
            Err(Error::Aggregate {
                errors: pass.errors,
            })
        }
    }

    async fn managed_zones(&self, registrar: &dyn Registrar) -> Result<Vec<String>> {
        let zones = registrar.zones().await?;
        Ok(zones
            .into_iter()
            .filter(|z| self.domain_filter.matches(z))
            .collect())
    }

    async fn apply_deletes(
        &self,
        registrar: &dyn Registrar,
        zones: &[String],
        endpoints: &[Endpoint],
        pass: &mut Pass,
    ) {
        let mut cache = ZoneRecordCache::new();

        for ep in endpoints {
            let zone = match resolve_zone(zones, &ep.dns_name) {
                Ok(zone) => zone,
                Err(e) => {
                    error!("Failed to find zone for endpoint: {}", e);
                    pass.fail(e);
                    continue;
                }
            };
            let records = match cache.get_or_fetch(registrar, zone).await {
                Ok(records) => records,
                Err(e) => {
                    error!("Failed to query DNS zone info for {}: {}", zone, e);
                    pass.fail(e);
                    continue;
                }
            };
            let ids = match match_targets(zone, records, ep) {
                Ok(ids) => ids,
                Err(e) => {
                    error!("Failed to look up records to delete: {}", e);
                    pass.fail(e);
                    continue;
                }
            };

            for id in &ids {
                self.delete(registrar, id, ep, pass).await;
            }
        }
    }

    async fn apply_creates(
        &self,
        registrar: &dyn Registrar,
        zones: &[String],
        endpoints: &[Endpoint],
        pass: &mut Pass,
    ) {
        let mut cache = ZoneRecordCache::new();

        for ep in endpoints {
            let zone = match resolve_zone(zones, &ep.dns_name) {
                Ok(zone) => zone,
                Err(e) => {
                    error!("Failed to find zone for endpoint: {}", e);
                    pass.fail(e);
                    continue;
                }
            };
            let records = match cache.get_or_fetch(registrar, zone).await {
                Ok(records) => records,
                Err(e) => {
                    error!("Failed to query DNS zone info for {}: {}", zone, e);
                    pass.fail(e);
                    continue;
                }
            };
            let name = record_name(&ep.dns_name, zone);

            for target in &ep.targets {
                let existing = find_by_name_and_type(zone, records, &ep.dns_name, &ep.record_type);
                if find_exact(&existing, target).is_some() {
                    debug!(
                        "Record already exists, skipping create: {} {} {}",
                        ep.dns_name, ep.record_type, target
                    );
                    pass.summary.skipped += 1;
                    continue;
                }

                let request = self.request(zone, &name, ep, target, ep.record_ttl);

                // A lone record of this name and type is replaced in place
                // rather than joined by a second one.
                if let [single] = existing.as_slice()
                    && ep.targets.len() == 1
                {
                    info!(
                        "Record {} {} exists with different content, updating {} -> {}",
                        ep.dns_name, ep.record_type, single.content, target
                    );
                    self.update(registrar, &single.id, &request, pass).await;
                    continue;
                }

                self.create(registrar, &request, pass).await;
            }
        }
    }

    async fn apply_updates(
        &self,
        registrar: &dyn Registrar,
        zones: &[String],
        update_old: &[Endpoint],
        update_new: &[Endpoint],
        pass: &mut Pass,
    ) {
        if update_old.len() != update_new.len() {
            warn!(
                "Update lists differ in length ({} old, {} new); unpaired entries are skipped",
                update_old.len(),
                update_new.len()
            );
            for ep in update_old.iter().skip(update_new.len()) {
                pass.fail(Error::Other(format!("update for {} has no new endpoint", ep)));
            }
            for ep in update_new.iter().skip(update_old.len()) {
                pass.fail(Error::Other(format!("update for {} has no old endpoint", ep)));
            }
        }

        let mut cache = ZoneRecordCache::new();

        for (old_ep, new_ep) in update_old.iter().zip(update_new) {
            let zone = match resolve_zone(zones, &old_ep.dns_name) {
                Ok(zone) => zone,
                Err(e) => {
                    error!("Failed to update DNS record for endpoint: {}", e);
                    pass.fail(e);
                    continue;
                }
            };
            let records = match cache.get_or_fetch(registrar, zone).await {
                Ok(records) => records,
                Err(e) => {
                    error!("Failed to query DNS zone info for {}: {}", zone, e);
                    pass.fail(e);
                    continue;
                }
            };
            let name = record_name(&new_ep.dns_name, zone);

            let ids = match match_targets(zone, records, old_ep) {
                Ok(ids) => ids,
                Err(e) => {
                    warn!(
                        "Old records not found for update of {}, falling back to create: {}",
                        old_ep.dns_name, e
                    );
                    let existing =
                        find_by_name_and_type(zone, records, &new_ep.dns_name, &new_ep.record_type);
                    for target in &new_ep.targets {
                        if find_exact(&existing, target).is_some() {
                            pass.summary.skipped += 1;
                            continue;
                        }
                        let request = self.request(zone, &name, new_ep, target, new_ep.record_ttl);
                        self.create(registrar, &request, pass).await;
                    }
                    continue;
                }
            };

            let n = old_ep.targets.len().max(new_ep.targets.len()).max(ids.len());
            for j in 0..n {
                match (new_ep.targets.get(j), old_ep.targets.get(j), ids.get(j)) {
                    (None, _, Some(id)) => {
                        self.delete(registrar, id, old_ep, pass).await;
                    }
                    (Some(target), None, _) => {
                        let request = self.request(zone, &name, new_ep, target, new_ep.record_ttl);
                        self.create(registrar, &request, pass).await;
                    }
                    (Some(target), Some(_), Some(id)) => {
                        let request = self.request(zone, &name, new_ep, target, old_ep.record_ttl);
                        self.update(registrar, id, &request, pass).await;
                    }
                    // match_targets yields one id per old target
                    (None, _, None) | (Some(_), Some(_), None) => {
                        error!("No record identifier for target {} of {}", j, old_ep);
                    }
                }
            }
        }
    }

    fn request(
        &self,
        zone: &str,
        name: &str,
        ep: &Endpoint,
        content: &str,
        ttl: u32,
    ) -> RecordRequest {
        RecordRequest {
            zone: zone.to_string(),
            name: name.to_string(),
            record_type: ep.record_type.clone(),
            ttl: self.engine.effective_ttl(ttl),
            content: content.to_string(),
            priority: 0,
        }
    }

    async fn create(&self, registrar: &dyn Registrar, request: &RecordRequest, pass: &mut Pass) {
        match registrar.create_record(request).await {
            Ok(()) => {
                debug!(
                    "Created record {:?} {} {} in {}",
                    request.name, request.record_type, request.content, request.zone
                );
                pass.summary.created += 1;
            }
            Err(e) if e.is_object_exists() => {
                debug!(
                    "Record already exists in {}, skipping: {:?} {} {}",
                    registrar.registrar_name(),
                    request.name,
                    request.record_type,
                    request.content
                );
                pass.summary.skipped += 1;
            }
            Err(e) => {
                error!("Failed to create record {:?}: {}", request, e);
                pass.fail(e);
            }
        }
    }

    async fn update(
        &self,
        registrar: &dyn Registrar,
        id: &RecordId,
        request: &RecordRequest,
        pass: &mut Pass,
    ) {
        match registrar.update_record(id, request).await {
            Ok(()) => {
                debug!("Updated record {} -> {}", id, request.content);
                pass.summary.updated += 1;
            }
            Err(e) => {
                error!("Failed to update record {} {:?}: {}", id, request, e);
                pass.fail(e);
            }
        }
    }

    async fn delete(&self, registrar: &dyn Registrar, id: &RecordId, ep: &Endpoint, pass: &mut Pass) {
        match registrar.delete_record(id).await {
            Ok(()) => {
                debug!("Deleted record {} of {}", id, ep.dns_name);
                pass.summary.deleted += 1;
            }
            Err(e) => {
                error!("Failed to delete record {} of {}: {}", id, ep, e);
                pass.fail(e);
            }
        }
    }
}
