//! Error types for the session crate.

use bk_types::{AssetId, Category, ProjectName};

/// Errors that can occur during session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The dedup gate only admits deduplicated categories.
    #[error("category {0} is not deduplicated")]
    CategoryNotDeduplicated(Category),

    /// The operation needs an active project and none is set.
    #[error("no active project")]
    NoActiveProject,

    /// The referenced asset does not exist.
    #[error("asset not found: {0}")]
    NotFound(AssetId),

    /// The asset belongs to a different project than the active one.
    #[error("asset {id} belongs to project {actual}, not {expected}")]
    WrongProject {
        id: AssetId,
        expected: ProjectName,
        actual: ProjectName,
    },

    /// Only generated assets can be selected.
    #[error("asset {id} is a {actual} asset; only generated assets can be selected")]
    WrongCategory { id: AssetId, actual: Category },

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] bk_store::StoreError),
}

impl SessionError {
    /// Whether the failure is transient and the operation may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_transient())
    }
}

/// Convenience alias for session results.
pub type SessionResult<T> = Result<T, SessionError>;
