//! Session state for brandkit.
//!
//! Everything a user's working session tracks on top of the store: which
//! project is active, which generated asset is selected in each project,
//! and which uploads were already admitted.
//!
//! # Key Types
//!
//! - [`DedupGate`] -- Admits reference uploads at most once per digest
//! - [`Admission`] -- Result of an upload: identifier plus `created` flag
//! - [`ProcessedUploads`] -- Session-local memo in front of the digest index
//! - [`SelectionCursors`] -- One optional selection per project
//! - [`FallbackPolicy`] -- Cursor behavior when the selection is deleted
//! - [`Session`] -- The explicit session value tying these together

pub mod cursor;
pub mod error;
pub mod gate;
pub mod processed;
pub mod session;

pub use cursor::{FallbackPolicy, SelectionCursors};
pub use error::{SessionError, SessionResult};
pub use gate::{Admission, DedupGate};
pub use processed::ProcessedUploads;
pub use session::Session;
