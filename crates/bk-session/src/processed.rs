//! Per-session memo of admitted uploads.

use std::collections::HashMap;

use bk_types::{AssetId, Category, ContentDigest, ProjectName};

type Key = (ProjectName, Category, ContentDigest);

/// Maps (project, category, digest) to the asset previously admitted for it.
///
/// This is a cache in front of the store's digest index. The store stays
/// authoritative: a stale entry can only come from a deletion made outside
/// this session.
#[derive(Clone, Debug, Default)]
pub struct ProcessedUploads {
    entries: HashMap<Key, AssetId>,
}

impl ProcessedUploads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        project: &ProjectName,
        category: Category,
        digest: &ContentDigest,
    ) -> Option<AssetId> {
        self.entries
            .get(&(project.clone(), category, *digest))
            .copied()
    }

    pub fn remember(
        &mut self,
        project: &ProjectName,
        category: Category,
        digest: ContentDigest,
        id: AssetId,
    ) {
        self.entries.insert((project.clone(), category, digest), id);
    }

    /// Drop every entry pointing at `id`. Returns how many were dropped.
    pub fn forget_asset(&mut self, id: &AssetId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, admitted| admitted != id);
        before - self.entries.len()
    }

    /// Drop every entry of a project.
    pub fn forget_project(&mut self, project: &ProjectName) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(p, _, _), _| p != project);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
