//! Configuration types for the reconciliation engine
//!
//! This module defines all configuration structures used throughout the crate.

use crate::filter::DomainFilter;
use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Registrar configuration
    pub registrar: RegistrarConfig,

    /// Zones to manage; empty manages every zone of the account
    #[serde(default)]
    pub domain_filter: DomainFilter,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl SyncConfig {
    /// Create a new configuration with defaults
    pub fn new(registrar: RegistrarConfig) -> Self {
        Self {
            registrar,
            domain_filter: DomainFilter::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Restrict the managed zones
    pub fn with_domain_filter(mut self, filter: DomainFilter) -> Self {
        self.domain_filter = filter;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.registrar.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// Registrar configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistrarConfig {
    /// INWX JSON-RPC API
    Inwx {
        /// Account user name
        username: String,
        /// Account password
        password: String,
        /// Use the OT&E sandbox instead of the live API
        #[serde(default)]
        sandbox: bool,
    },

    /// In-memory registrar (testing, dry runs)
    Memory {
        /// Zones to create up front
        #[serde(default)]
        zones: Vec<String>,
    },

    /// Custom registrar
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl RegistrarConfig {
    /// Validate the registrar configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            RegistrarConfig::Inwx {
                username, password, ..
            } => {
                if username.is_empty() {
                    return Err(crate::Error::config("INWX username cannot be empty"));
                }
                if password.is_empty() {
                    return Err(crate::Error::config("INWX password cannot be empty"));
                }
                Ok(())
            }
            RegistrarConfig::Memory { zones } => {
                if zones.iter().any(|z| z.trim().is_empty()) {
                    return Err(crate::Error::config("Memory registrar zone names cannot be empty"));
                }
                Ok(())
            }
            RegistrarConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom registrar factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom registrar config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the registrar type name
    pub fn type_name(&self) -> &str {
        match self {
            RegistrarConfig::Inwx { .. } => "inwx",
            RegistrarConfig::Memory { .. } => "memory",
            RegistrarConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        RegistrarConfig::Memory { zones: Vec::new() }
    }
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for RegistrarConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrarConfig::Inwx {
                username, sandbox, ..
            } => f
                .debug_struct("Inwx")
                .field("username", username)
                .field("password", &"<REDACTED>")
                .field("sandbox", sandbox)
                .finish(),
            RegistrarConfig::Memory { zones } => {
                f.debug_struct("Memory").field("zones", zones).finish()
            }
            RegistrarConfig::Custom { factory, config } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", config)
                .finish(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// TTL applied when an endpoint does not configure one (in seconds)
    #[serde(default = "default_ttl")]
    pub default_ttl: u32,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.default_ttl == 0 {
            return Err(crate::Error::config("Default TTL must be > 0"));
        }
        Ok(())
    }

    /// TTL to send for an endpoint TTL, substituting the default for 0
    pub fn effective_ttl(&self, ttl: u32) -> u32 {
        if ttl == 0 { self.default_ttl } else { ttl }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_ttl: default_ttl(),
        }
    }
}

fn default_ttl() -> u32 {
    3600
}
