//! Registry Query-Path Error Hierarchy
//!
//! Defines error types for the multi-source discovery engine, categorized by
//! subsystem: query routing, backend storage, schema store and configuration.

use std::time::Duration;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Query-path failures (prefix violations, source timeouts)
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// Registry settings validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Backend storage failures (embedded database, serialization)
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Schema metadata and content store failures
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Service and instance record failures
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug)]
pub enum DiscoveryError {
    /// Query key falls outside the range a cache is authoritative for.
    /// Always a hard error, never treated as a cache miss.
    PrefixMismatch {
        key: String,
        prefix: String,
        cache: String,
    },

    /// A backend search exceeded its configured deadline
    Timeout { source: String, timeout: Duration },

    /// The designated local source named in configuration is not wired in
    UnknownLocalSource(String),
}

// Hand-written impls: thiserror's derive treats a field named `source` as the
// error source, which `String` cannot satisfy.
impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryError::PrefixMismatch { key, prefix, cache } => write!(
                f,
                "key '{key}' does not match prefix '{prefix}', cache is '{cache}'"
            ),
            DiscoveryError::Timeout { source, timeout } => {
                write!(f, "search against '{source}' timed out after {timeout:?}")
            }
            DiscoveryError::UnknownLocalSource(name) => {
                write!(f, "no adaptor registered under local source name '{name}'")
            }
        }
    }
}

impl std::error::Error for DiscoveryError {}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Disk I/O failures during backend operations
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// Serialization failures for stored payloads
    #[error(transparent)]
    BincodeError(#[from] bincode::Error),

    /// Embedded database errors
    #[error("Embedded database error: {0}")]
    DbError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("schema does not exist")]
    SchemaNotFound,

    #[error("schema content does not exist")]
    SchemaContentNotFound,

    /// Content keys are shared by hash; deleting one that is still referenced
    /// by any service record is rejected.
    #[error("schema content [{hash}] is referenced by a service")]
    StillReferenced { hash: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("service [{0}] does not exist")]
    ServiceNotFound(String),

    #[error("instance [{0}] does not exist")]
    InstanceNotFound(String),
}

impl From<sled::Error> for StorageError {
    fn from(e: sled::Error) -> Self {
        StorageError::DbError(e.to_string())
    }
}

impl From<sled::Error> for Error {
    fn from(e: sled::Error) -> Self {
        Error::Storage(e.into())
    }
}
