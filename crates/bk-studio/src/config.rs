use std::path::{Path, PathBuf};
use std::time::Duration;

use bk_session::FallbackPolicy;
use bk_store::SyncMode;
use serde::{Deserialize, Serialize};

use crate::error::{StudioError, StudioResult};

/// Where assets and project records live.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Process-local, lost on exit.
    Memory,
    /// Under `root` on disk.
    #[default]
    File,
}

/// Configuration for a [`Studio`](crate::Studio).
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Root directory for the file backend.
    pub root: PathBuf,
    pub backend: Backend,
    /// Journal and content sync strategy for the file backend.
    pub sync: SyncMode,
    /// Upper bound on each collaborator call.
    pub request_timeout_secs: u64,
    /// Retry store reads once when they fail transiently.
    pub retry_transient_once: bool,
    /// Cursor behavior when the selected asset is deleted.
    pub selection_fallback: FallbackPolicy,
    /// Number of images in a series when the caller does not say.
    pub default_series_size: usize,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".brandkit"),
            backend: Backend::File,
            sync: SyncMode::default(),
            request_timeout_secs: 60,
            retry_transient_once: true,
            selection_fallback: FallbackPolicy::default(),
            default_series_size: 3,
        }
    }
}

impl StudioConfig {
    /// In-memory configuration for tests and embedding.
    pub fn ephemeral() -> Self {
        Self {
            backend: Backend::Memory,
            ..Default::default()
        }
    }

    /// File-backed configuration rooted at `root`.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn from_toml_str(s: &str) -> StudioResult<Self> {
        toml::from_str(s).map_err(|e| StudioError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> StudioResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| StudioError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
