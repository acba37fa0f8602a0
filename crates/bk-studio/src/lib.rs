//! High-level API for brandkit.
//!
//! [`Studio`] ties the asset store, the project registry and session state
//! together, and orchestrates image generation through pluggable
//! [`PromptGenerator`] and [`ImageGenerator`] collaborators. This is the
//! main entry point for front ends embedding brandkit.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod prompt;
pub mod studio;

pub use collaborators::{ImageGenerator, PromptGenerator, UpstreamError};
pub use config::{Backend, StudioConfig};
pub use error::{StudioError, StudioResult};
pub use prompt::{GenerationRequest, PromptComposer};
pub use studio::{Generated, ProjectDeletion, Studio};

// Re-export key types
pub use bk_registry::ProjectRecord;
pub use bk_session::{Admission, FallbackPolicy, Session};
pub use bk_store::{AssetMeta, SyncMode};
pub use bk_types::{AssetId, Category, ProjectName};
