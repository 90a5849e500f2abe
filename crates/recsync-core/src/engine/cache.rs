//! Per-phase memoization of zone record snapshots

use crate::error::Result;
use crate::traits::{Registrar, RemoteRecord};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Zone snapshots fetched lazily during one phase of a pass
///
/// A new cache is created for every phase and dropped at its end.
#[derive(Debug, Default)]
pub(crate) struct ZoneRecordCache {
    zones: HashMap<String, Vec<RemoteRecord>>,
}

impl ZoneRecordCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The zone's records, fetched from `registrar` on first use
    ///
    /// A failed fetch is not cached; the next request for the zone tries again.
    pub(crate) async fn get_or_fetch(
        &mut self,
        registrar: &dyn Registrar,
        zone: &str,
    ) -> Result<&[RemoteRecord]> {
        match self.zones.entry(zone.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut().as_slice()),
            Entry::Vacant(entry) => {
                let records = registrar.records(zone).await?;
                Ok(entry.insert(records).as_slice())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registrar::MemoryRegistrar;

    #[tokio::test]
    async fn fetches_each_zone_once() {
        let registrar = MemoryRegistrar::with_zones(["example.com"]);
        registrar
            .seed_record("example.com", "foo", "A", "1.1.1.1", 60)
            .await
            .unwrap();
        registrar.login().await.unwrap();

        let mut cache = ZoneRecordCache::new();
        assert_eq!(cache.get_or_fetch(&registrar, "example.com").await.unwrap().len(), 1);

        registrar
            .seed_record("example.com", "bar", "A", "1.1.1.1", 60)
            .await
            .unwrap();
        assert_eq!(cache.get_or_fetch(&registrar, "example.com").await.unwrap().len(), 1);
        assert_eq!(registrar.calls().await.records, 1);
    }

    #[tokio::test]
    async fn failed_fetch_is_not_cached() {
        let registrar = MemoryRegistrar::new();
        registrar.login().await.unwrap();

        let mut cache = ZoneRecordCache::new();
        assert!(cache.get_or_fetch(&registrar, "example.com").await.is_err());
        registrar.create_zone("example.com").await.unwrap();
        assert!(cache.get_or_fetch(&registrar, "example.com").await.is_ok());
        assert_eq!(registrar.calls().await.records, 2);
    }
}
