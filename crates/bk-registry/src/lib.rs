//! Project registry for brandkit.
//!
//! A project is a named workspace that owns assets. This crate tracks which
//! projects exist. Asset storage and per-session state live elsewhere and
//! are cascaded by the studio facade when a project is deleted.
//!
//! # Modules
//!
//! - [`error`] -- Error types for registry operations
//! - [`types`] -- [`ProjectRecord`]
//! - [`traits`] -- The [`ProjectRegistry`] trait defining the storage interface
//! - [`memory`] -- In-memory [`InMemoryProjectRegistry`] for tests
//! - [`file`] -- [`FileProjectRegistry`] persisted as `projects.json`

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::{RegistryError, Result};
pub use file::FileProjectRegistry;
pub use memory::InMemoryProjectRegistry;
pub use traits::ProjectRegistry;
pub use types::ProjectRecord;
