use std::time::Duration;

use bk_registry::RegistryError;
use bk_session::SessionError;
use bk_store::StoreError;
use bk_types::{AssetId, ProjectName, TypeError};
use thiserror::Error;

use crate::collaborators::UpstreamError;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectName),

    #[error("asset not found: {0}")]
    AssetNotFound(AssetId),

    #[error("no asset is selected in project {0}")]
    NoSelection(ProjectName),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("image is empty")]
    EmptyImage,

    #[error("prompt generator returned an empty prompt")]
    EmptyPrompt,

    #[error("{0}")]
    Upstream(#[from] UpstreamError),

    #[error("{what} timed out after {after:?}")]
    Timeout { what: &'static str, after: Duration },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    InvalidName(#[from] TypeError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

impl StudioError {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Upstream(UpstreamError::Unavailable(_)) => true,
            Self::Store(e) => e.is_transient(),
            Self::Registry(e) => e.is_transient(),
            Self::Session(e) => e.is_transient(),
            _ => false,
        }
    }
}

pub type StudioResult<T> = Result<T, StudioError>;
