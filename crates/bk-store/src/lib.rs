//! Project-scoped asset storage for brandkit.
//!
//! Every asset lives in exactly one project and one [`Category`]
//! (`reference` or `generated`). Assets are immutable once written and are
//! addressed by a store-assigned [`AssetId`]. Reference uploads carry a
//! [`ContentDigest`], and the store keeps at most one asset per digest in
//! each (project, category) scope.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileBlobStore`] -- content files plus a CRC-framed catalog journal
//!
//! # Design Rules
//!
//! 1. Identifiers are never reused, even after deletion.
//! 2. A colliding digest-bearing `put` fails with [`StoreError::Conflict`]
//!    and writes nothing.
//! 3. Content is written before the catalog entry that points at it.
//! 4. Listing order is creation order within a scope.
//! 5. All I/O errors are propagated, never silently ignored.
//!
//! [`Category`]: bk_types::Category
//! [`AssetId`]: bk_types::AssetId
//! [`ContentDigest`]: bk_types::ContentDigest

pub mod asset;
mod catalog;
pub mod error;
pub mod file;
pub mod journal;
pub mod memory;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use asset::{AssetMeta, NewAsset};
pub use error::{StoreError, StoreResult};
pub use file::{FileBlobStore, FileStoreConfig};
pub use journal::{CatalogJournal, CatalogRecord, SyncMode};
pub use memory::InMemoryBlobStore;
pub use traits::BlobStore;
