//! Error types for registry operations

use crate::MetadataKind;
use thiserror::Error;

/// Backing store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Backing store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Failed to read snapshot from {path}: {reason}")]
    SnapshotRead { path: String, reason: String },

    #[error("Failed to write snapshot to {path}: {reason}")]
    SnapshotWrite { path: String, reason: String },

    #[error("Malformed snapshot document: {reason}")]
    MalformedSnapshot { reason: String },

    #[error("Registry lock poisoned")]
    LockPoisoned,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for registry operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{kind} {name} does not exist in project {project}")]
    NotFound {
        kind: MetadataKind,
        name: String,
        project: String,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl RegistryError {
    /// Build a not-found error for a named object.
    pub fn not_found(
        kind: MetadataKind,
        name: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        RegistryError::NotFound {
            kind,
            name: name.into(),
            project: project.into(),
        }
    }

    /// Returns true if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound { .. })
    }
}

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

// =============================================================================
// TESTS
// =============================================================================
