//! Core traits for the reconciliation engine
//!
//! - [`Registrar`]: session-based access to registrar zones and records

pub mod registrar;

pub use registrar::{
    RecordId, RecordRequest, Registrar, RegistrarFactory, RemoteRecord, SessionInfo,
};
