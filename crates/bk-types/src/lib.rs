//! Foundation types for brandkit.
//!
//! This crate provides the identity and naming types shared by every other
//! brandkit crate. It has no knowledge of storage or hashing algorithms.
//!
//! # Key Types
//!
//! - [`ProjectName`]: Validated, user-visible project key
//! - [`AssetId`]: Store-assigned asset identifier (UUID v7, never reused)
//! - [`Category`]: The two asset namespaces: `reference` and `generated`
//! - [`ContentDigest`]: 32-byte content fingerprint used for deduplication

pub mod asset;
pub mod digest;
pub mod error;
pub mod project;

pub use asset::{AssetId, Category};
pub use digest::ContentDigest;
pub use error::TypeError;
pub use project::ProjectName;
