use bk_types::{AssetId, Category, ContentDigest, ProjectName};

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying storage medium cannot be reached or is unusable.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The requested asset does not exist.
    #[error("asset not found: {0}")]
    NotFound(AssetId),

    /// A digest-bearing asset with the same scope and digest already exists.
    #[error("asset with digest {} already exists in {project}/{category}: {existing}", .digest.short_hex())]
    Conflict {
        project: ProjectName,
        category: Category,
        digest: ContentDigest,
        existing: AssetId,
    },

    /// Stored content no longer matches its recorded digest, or is missing.
    #[error("corrupt asset {id}: {reason}")]
    CorruptObject { id: AssetId, reason: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether the failure is transient and the operation may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_) | Self::Io(_))
    }

    pub(crate) fn poisoned(what: &str) -> Self {
        Self::StorageUnavailable(format!("{what} lock poisoned"))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
