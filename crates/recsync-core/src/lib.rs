// # recsync-core
//
// Core library for converging registrar DNS records to a desired state.
//
// ## Architecture Overview
//
// An orchestrator (external-dns style) computes a ChangeSet of endpoints to
// create, update and delete. This crate applies it to a registrar:
// - **Registrar**: Trait for session-based access to zones and records
// - **Reconciler**: Engine running the Delete → Create → Update pass
// - **resolver / matcher**: Pure name-to-zone and target-to-record mapping
// - **RegistrarRegistry**: Plugin-based registry for registrar implementations
//
// ## Design Principles
//
// 1. **Library-First**: The daemon is a thin shell over this crate
// 2. **Plugin-Based**: Registrars are registered by name, no hard-coded match
// 3. **Convergent**: Re-applying a change set leaves the registrar unchanged
// 4. **Partial Progress**: One failing record never aborts the pass

pub mod config;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod filter;
pub mod matcher;
pub mod registrar;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod traits;

// Re-export core types for convenience
pub use config::{EngineConfig, RegistrarConfig, SyncConfig};
pub use endpoint::{ChangeSet, Endpoint};
pub use engine::{PassSummary, Reconciler};
pub use error::{Error, Result};
pub use filter::DomainFilter;
pub use registrar::MemoryRegistrar;
pub use registry::RegistrarRegistry;
pub use session::Session;
pub use traits::{RecordId, RecordRequest, Registrar, RegistrarFactory, RemoteRecord, SessionInfo};
