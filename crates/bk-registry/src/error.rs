//! Error types for project registry operations.

use bk_types::{ProjectName, TypeError};
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A project with this name already exists.
    #[error("project already exists: {name}")]
    AlreadyExists { name: ProjectName },

    /// The project was not found.
    #[error("project not found: {name}")]
    NotFound { name: String },

    /// The project name failed validation.
    #[error(transparent)]
    InvalidName(#[from] TypeError),

    /// The registry backend cannot be reached or its lock is poisoned.
    #[error("registry unavailable: {0}")]
    StorageUnavailable(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error during file-based registry operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    pub(crate) fn poisoned() -> Self {
        Self::StorageUnavailable("registry lock poisoned".into())
    }

    /// Whether the failure is transient and the operation may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_) | Self::Io(_))
    }
}

/// Convenience type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
