//! Error types for the reconciliation engine
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Registrar code for "Object exists"
pub const OBJECT_EXISTS: u32 = 2302;

/// Registrar code for "Object does not exist"
pub const OBJECT_DOES_NOT_EXIST: u32 = 2303;

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the reconciliation engine
#[derive(Error, Debug)]
pub enum Error {
    /// No registrar zone owns the given DNS name
    #[error("unable to find matching zone for {name}")]
    ZoneNotFound {
        /// The DNS name that could not be placed
        name: String,
    },

    /// Not every endpoint target maps to a live record
    #[error(
        "failed to map all targets of {name} ({record_type}) to records: found {found} of {expected}"
    )]
    IncompleteMapping {
        /// The endpoint DNS name
        name: String,
        /// The endpoint record type
        record_type: String,
        /// Number of targets on the endpoint
        expected: usize,
        /// Number of identifiers found
        found: usize,
    },

    /// Failure surfaced by the registrar capability
    #[error("registrar error{}: {message}", .code.map(|c| format!(" ({c})")).unwrap_or_default())]
    Registrar {
        /// Registrar result code, when the registrar returned one
        code: Option<u32>,
        /// Error message
        message: String,
    },

    /// One or more sub-operations of a pass failed
    #[error("encountered {} errors while applying changes", .errors.len())]
    Aggregate {
        /// Every failure recorded during the pass
        errors: Vec<Error>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors (from registrar APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a zone-not-found error
    pub fn zone_not_found(name: impl Into<String>) -> Self {
        Self::ZoneNotFound { name: name.into() }
    }

    /// Create a registrar error without a result code
    pub fn registrar(message: impl Into<String>) -> Self {
        Self::Registrar {
            code: None,
            message: message.into(),
        }
    }

    /// Create a registrar error carrying a result code
    pub fn registrar_code(code: u32, message: impl Into<String>) -> Self {
        Self::Registrar {
            code: Some(code),
            message: message.into(),
        }
    }

    /// Create an "object exists" registrar error
    pub fn object_exists(message: impl Into<String>) -> Self {
        Self::registrar_code(OBJECT_EXISTS, message)
    }

    /// Create an "object does not exist" registrar error
    pub fn object_missing(message: impl Into<String>) -> Self {
        Self::registrar_code(OBJECT_DOES_NOT_EXIST, message)
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// True when the registrar reported that the object already exists
    pub fn is_object_exists(&self) -> bool {
        matches!(self, Self::Registrar { code: Some(OBJECT_EXISTS), .. })
    }

    /// True when the registrar reported that the object does not exist
    pub fn is_object_missing(&self) -> bool {
        matches!(self, Self::Registrar { code: Some(OBJECT_DOES_NOT_EXIST), .. })
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
