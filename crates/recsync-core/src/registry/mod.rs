//! Plugin-based registrar registry
//!
//! Registrar implementations live in their own crates and register a factory
//! under their type name; the daemon picks one from configuration without a
//! hard-coded match on registrar types.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use recsync_core::registry::RegistrarRegistry;
//! use recsync_core::config::RegistrarConfig;
//!
//! let registry = RegistrarRegistry::with_builtin();
//! recsync_registrar_inwx::register(&registry);
//!
//! let config = RegistrarConfig::Inwx { ... };
//! let registrar = registry.create_registrar(&config)?;
//! ```
//!
//! ## Registration
//!
//! Implementations expose a `register` function:
//!
//! ```rust,ignore
//! // In recsync-registrar-inwx
//! pub fn register(registry: &RegistrarRegistry) {
//!     registry.register_registrar("inwx", Box::new(InwxFactory));
//! }
//! ```

use crate::config::RegistrarConfig;
use crate::error::{Error, Result};
use crate::registrar::MemoryRegistrarFactory;
use crate::traits::{Registrar, RegistrarFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry mapping registrar type names to factories
///
/// Uses interior mutability, so registration works through a shared reference.
#[derive(Default)]
pub struct RegistrarRegistry {
    registrars: RwLock<HashMap<String, Box<dyn RegistrarFactory>>>,
}

impl RegistrarRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the registrars shipped in this crate ("memory")
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register_registrar("memory", Box::new(MemoryRegistrarFactory));
        registry
    }

    /// Register a registrar factory
    ///
    /// # Parameters
    ///
    /// - `name`: Registrar type name, as returned by [`RegistrarConfig::type_name`]
    /// - `factory`: Factory creating registrar instances
    ///
    /// A factory registered under an existing name replaces it.
    pub fn register_registrar(&self, name: impl Into<String>, factory: Box<dyn RegistrarFactory>) {
        let mut registrars = self
            .registrars
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        registrars.insert(name.into(), factory);
    }

    /// Create a registrar from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn Registrar>)`: Created registrar
    /// - `Err(Error::Config)`: If the type is not registered, or the factory's error
    pub fn create_registrar(&self, config: &RegistrarConfig) -> Result<Box<dyn Registrar>> {
        let registrar_type = config.type_name();
        let registrars = self
            .registrars
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = registrars.get(registrar_type).ok_or_else(|| {
            Error::config(format!("Unknown registrar type: {}", registrar_type))
        })?;

        factory.create(config)
    }

    /// Registered registrar type names, sorted
    pub fn list_registrars(&self) -> Vec<String> {
        let registrars = self
            .registrars
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = registrars.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a registrar type is registered
    pub fn has_registrar(&self, name: &str) -> bool {
        self.registrars
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}
