//! Domain and storage error model.

use thiserror::Error;

/// Domain-level error.
///
/// Deterministic failures that do not involve the storage collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

/// Failure reported by the storage collaborator.
///
/// Lookups that may legitimately find nothing return `Ok(None)`; `NotFound`
/// is reserved for by-id mutations whose target vanished.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    /// A write would break a uniqueness constraint the store enforces.
    #[error("{0}")]
    Conflict(String),

    #[error("storage backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl StorageError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
