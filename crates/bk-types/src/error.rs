use thiserror::Error;

/// Errors produced by type parsing and validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid project name {name:?}: {reason}")]
    InvalidProjectName { name: String, reason: String },

    #[error("invalid asset id: {0}")]
    InvalidAssetId(String),

    #[error("unknown asset category: {0}")]
    UnknownCategory(String),
}
