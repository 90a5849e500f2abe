//! Test doubles and common utilities for engine contract tests
//!
//! [`FlakyRegistrar`] wraps a [`MemoryRegistrar`] and injects failures into
//! selected calls, so contract tests can check how the engine behaves when
//! the registrar misbehaves.

#![allow(dead_code)]

use recsync_core::error::{Error, Result};
use recsync_core::registrar::MemoryRegistrar;
use recsync_core::traits::{RecordId, RecordRequest, Registrar, RemoteRecord, SessionInfo};
use recsync_core::{Endpoint, Reconciler, RegistrarConfig, SyncConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const ZONE: &str = "example.com";

/// Which calls a [`FlakyRegistrar`] fails
#[derive(Debug, Clone, Default)]
pub struct Faults {
    pub login: bool,
    pub logout: bool,
    pub zones: bool,
    /// Fail `records` for this zone
    pub records_zone: Option<String>,
    /// Fail create/update requests carrying this content
    pub content: Option<String>,
    /// Fail deletes of these identifiers
    pub delete_ids: Vec<RecordId>,
}

/// A registrar delegating to memory storage, with injected failures
///
/// Clones share storage and counters.
#[derive(Clone)]
pub struct FlakyRegistrar {
    inner: MemoryRegistrar,
    faults: Faults,
    login_calls: Arc<AtomicUsize>,
    logout_calls: Arc<AtomicUsize>,
    injected: Arc<AtomicUsize>,
}

impl FlakyRegistrar {
    pub fn new(inner: MemoryRegistrar, faults: Faults) -> Self {
        Self {
            inner,
            faults,
            login_calls: Arc::new(AtomicUsize::new(0)),
            logout_calls: Arc::new(AtomicUsize::new(0)),
            injected: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times login() was called
    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    /// Get the number of times logout() was called
    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    /// Get the number of failures injected so far
    pub fn injected_failures(&self) -> usize {
        self.injected.load(Ordering::SeqCst)
    }

    fn inject(&self, what: &str) -> Error {
        self.injected.fetch_add(1, Ordering::SeqCst);
        Error::registrar_code(2400, format!("injected failure: {}", what))
    }
}

#[async_trait::async_trait]
impl Registrar for FlakyRegistrar {
    async fn login(&self) -> Result<SessionInfo> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if self.faults.login {
            self.injected.fetch_add(1, Ordering::SeqCst);
            return Err(Error::auth("injected login failure"));
        }
        self.inner.login().await
    }

    async fn logout(&self) -> Result<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.faults.logout {
            return Err(self.inject("logout"));
        }
        self.inner.logout().await
    }

    async fn zones(&self) -> Result<Vec<String>> {
        if self.faults.zones {
            return Err(self.inject("zones"));
        }
        self.inner.zones().await
    }

    async fn records(&self, zone: &str) -> Result<Vec<RemoteRecord>> {
        if self.faults.records_zone.as_deref() == Some(zone) {
            return Err(self.inject("records"));
        }
        self.inner.records(zone).await
    }

    async fn create_record(&self, request: &RecordRequest) -> Result<()> {
        if self.faults.content.as_deref() == Some(request.content.as_str()) {
            return Err(self.inject("create"));
        }
        self.inner.create_record(request).await
    }

    async fn update_record(&self, id: &RecordId, request: &RecordRequest) -> Result<()> {
        if self.faults.content.as_deref() == Some(request.content.as_str()) {
            return Err(self.inject("update"));
        }
        self.inner.update_record(id, request).await
    }

    async fn delete_record(&self, id: &RecordId) -> Result<()> {
        if self.faults.delete_ids.contains(id) {
            return Err(self.inject("delete"));
        }
        self.inner.delete_record(id).await
    }

    fn registrar_name(&self) -> &'static str {
        "flaky"
    }
}

/// Build a reconciler over `registrar` with default settings
pub fn reconciler(registrar: impl Registrar + 'static) -> Reconciler {
    Reconciler::new(
        Box::new(registrar),
        &SyncConfig::new(RegistrarConfig::default()),
    )
    .expect("default config is valid")
}

/// An "A" endpoint
pub fn a(name: &str, targets: &[&str]) -> Endpoint {
    Endpoint::new(name, "A", targets.iter().copied())
}

/// Sorted contents of the live records named `name` in `zone`
pub async fn contents(registrar: &MemoryRegistrar, zone: &str, name: &str) -> Vec<String> {
    let mut values: Vec<String> = registrar
        .snapshot(zone)
        .await
        .into_iter()
        .filter(|r| r.name == name)
        .map(|r| r.content)
        .collect();
    values.sort();
    values
}

/// Errors of an aggregate result
pub fn aggregated<T: std::fmt::Debug>(result: Result<T>) -> Vec<Error> {
    match result {
        Err(Error::Aggregate { errors }) => errors,
        other => panic!("expected aggregate error, got {:?}", other),
    }
}
