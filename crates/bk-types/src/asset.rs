use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Store-assigned identifier for an asset (UUID v7 for time-ordering).
///
/// Identifiers are opaque to callers and never reused: a deleted asset's id
/// will not be handed out again.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(uuid::Uuid);

impl AssetId {
    /// Generate a fresh time-ordered identifier.
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    /// Short representation (first 8 characters of the UUID).
    pub fn short_id(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for AssetId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| TypeError::InvalidAssetId(format!("{s}: {e}")))
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({})", self.short_id())
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The namespace an asset lives in.
///
/// Reference uploads and generated artifacts are kept in two logically
/// separate namespaces. Only `Reference` participates in content
/// deduplication: every generation or edit is a distinct artifact even when
/// two results happen to share the same bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Brand reference images uploaded by the user.
    Reference,
    /// Images produced by generation or editing (and images imported for editing).
    Generated,
}

impl Category {
    /// Both categories, in display order.
    pub const ALL: [Category; 2] = [Category::Reference, Category::Generated];

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::Generated => "generated",
        }
    }

    /// Whether uploads into this category go through content deduplication.
    pub fn is_deduplicated(&self) -> bool {
        matches!(self, Self::Reference)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reference" | "ref" => Ok(Self::Reference),
            "generated" | "gen" => Ok(Self::Generated),
            other => Err(TypeError::UnknownCategory(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_ids_are_unique() {
        let a = AssetId::new();
        let b = AssetId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn asset_id_parse_roundtrip() {
        let id = AssetId::new();
        let parsed: AssetId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn asset_id_parse_rejects_garbage() {
        assert!(matches!(
            "nope".parse::<AssetId>(),
            Err(TypeError::InvalidAssetId(_))
        ));
    }

    #[test]
    fn short_id_is_8_chars() {
        assert_eq!(AssetId::new().short_id().len(), 8);
    }

    #[test]
    fn only_reference_is_deduplicated() {
        assert!(Category::Reference.is_deduplicated());
        assert!(!Category::Generated.is_deduplicated());
    }

    #[test]
    fn category_parse() {
        assert_eq!("reference".parse::<Category>().unwrap(), Category::Reference);
        assert_eq!("Generated".parse::<Category>().unwrap(), Category::Generated);
        assert_eq!("ref".parse::<Category>().unwrap(), Category::Reference);
        assert!("thumbnail".parse::<Category>().is_err());
    }

    #[test]
    fn category_serde_is_lowercase() {
        let json = serde_json::to_string(&Category::Generated).unwrap();
        assert_eq!(json, "\"generated\"");
        let parsed: Category = serde_json::from_str("\"reference\"").unwrap();
        assert_eq!(parsed, Category::Reference);
    }
}
