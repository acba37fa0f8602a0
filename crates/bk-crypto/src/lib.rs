//! Content digest primitives for brandkit.
//!
//! Provides the domain-separated BLAKE3 hasher used to fingerprint asset
//! bytes for deduplication and read-time verification.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod hasher;

pub use hasher::{digest, ContentHasher};
