//! Error types for the catalog, repository, and status backend layers.

use crate::types::ItemId;
use thiserror::Error;

/// Storage-level failures (catalog persistence).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Catalog database error: {0}")]
    Sled(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Catalog transaction failed: {0}")]
    Transaction(String),

    #[error("Duplicate item id in record set: {0}")]
    DuplicateId(ItemId),
}

/// Item repository failures.
///
/// Only `Enumeration` is fatal to an index pass; every other variant degrades
/// the affected field to its zero value.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Failed to enumerate {root}: {message}")]
    Enumeration { root: String, message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Item cannot be loaded: {0}")]
    NotLoadable(String),

    #[error("Failed to probe {path}: {message}")]
    Probe { path: String, message: String },

    #[error("Rename failed for {path}: {message}")]
    Rename { path: String, message: String },
}

/// Status backend failures. Never fatal to an index pass.
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {code:?}: {stderr}")]
    Exit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} did not finish within {timeout_ms} ms")]
    Timeout { program: String, timeout_ms: u64 },

    #[error("I/O error talking to status backend: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error surfaced to callers of the catalog service and CLI.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Invalid field: {0}")]
    InvalidField(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<sled::Error> for ApiError {
    fn from(err: sled::Error) -> Self {
        ApiError::StorageError(StorageError::Sled(err))
    }
}
