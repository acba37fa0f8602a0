use bk_crypto::digest;
use bk_types::{AssetId, Category, ContentDigest, ProjectName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for a stored asset. Listing returns this without loading content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMeta {
    /// Store-assigned identifier, stable for the asset's lifetime.
    pub id: AssetId,
    /// Project the asset is scoped to.
    pub project: ProjectName,
    /// Namespace within the project.
    pub category: Category,
    /// Display name. Not unique.
    pub filename: String,
    /// Content fingerprint, present for deduplicated uploads.
    pub digest: Option<ContentDigest>,
    /// Content length in bytes.
    pub size: u64,
    /// Store-wide creation counter; defines listing order.
    pub seq: u64,
    /// Wall-clock creation time.
    pub created_at: DateTime<Utc>,
}

/// An asset about to be written. The store assigns id, seq and timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAsset {
    pub project: ProjectName,
    pub category: Category,
    pub filename: String,
    pub content: Vec<u8>,
    pub digest: Option<ContentDigest>,
}

impl NewAsset {
    /// A digest-bearing reference upload. The digest is computed here.
    pub fn reference(project: ProjectName, filename: impl Into<String>, content: Vec<u8>) -> Self {
        let digest = digest(&content);
        Self {
            project,
            category: Category::Reference,
            filename: filename.into(),
            content,
            digest: Some(digest),
        }
    }

    /// A generated artifact. Never carries a digest, so it is never deduplicated.
    pub fn generated(project: ProjectName, filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            project,
            category: Category::Generated,
            filename: filename.into(),
            content,
            digest: None,
        }
    }

    /// Build the metadata record for this asset once the store has
    /// allocated its identity.
    pub(crate) fn to_meta(&self, id: AssetId, seq: u64) -> AssetMeta {
        AssetMeta {
            id,
            project: self.project.clone(),
            category: self.category,
            filename: self.filename.clone(),
            digest: self.digest,
            size: self.content.len() as u64,
            seq,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> ProjectName {
        ProjectName::new("demo").unwrap()
    }

    #[test]
    fn reference_carries_digest() {
        let asset = NewAsset::reference(demo(), "a.png", b"bytes".to_vec());
        assert_eq!(asset.category, Category::Reference);
        assert_eq!(asset.digest, Some(digest(b"bytes")));
    }

    #[test]
    fn generated_has_no_digest() {
        let asset = NewAsset::generated(demo(), "g.png", b"bytes".to_vec());
        assert_eq!(asset.category, Category::Generated);
        assert!(asset.digest.is_none());
    }

    #[test]
    fn to_meta_copies_fields() {
        let asset = NewAsset::reference(demo(), "a.png", vec![1, 2, 3]);
        let id = AssetId::new();
        let meta = asset.to_meta(id, 7);
        assert_eq!(meta.id, id);
        assert_eq!(meta.size, 3);
        assert_eq!(meta.seq, 7);
        assert_eq!(meta.filename, "a.png");
        assert_eq!(meta.project, demo());
    }
}
