//! In-memory asset catalog shared by every backend.
//!
//! The catalog owns the metadata side of the store: the id → metadata map,
//! the (project, category, digest) uniqueness index, and the creation
//! counter. Backends differ only in where content bytes live and whether
//! catalog mutations are journaled.

use std::collections::HashMap;

use bk_types::{AssetId, Category, ContentDigest, ProjectName};
use tracing::warn;

use crate::asset::{AssetMeta, NewAsset};
use crate::error::{StoreError, StoreResult};
use crate::journal::CatalogRecord;

type DigestKey = (ProjectName, Category, ContentDigest);

#[derive(Debug, Default)]
pub(crate) struct Catalog {
    assets: HashMap<AssetId, AssetMeta>,
    by_digest: HashMap<DigestKey, AssetId>,
    next_seq: u64,
}

impl Catalog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.assets.len()
    }

    pub(crate) fn contains(&self, id: &AssetId) -> bool {
        self.assets.contains_key(id)
    }

    pub(crate) fn get(&self, id: &AssetId) -> Option<&AssetMeta> {
        self.assets.get(id)
    }

    /// Reject the asset if it would break digest uniqueness in its scope.
    pub(crate) fn check_unique(&self, asset: &NewAsset) -> StoreResult<()> {
        let Some(digest) = asset.digest else {
            return Ok(());
        };
        let key = (asset.project.clone(), asset.category, digest);
        match self.by_digest.get(&key) {
            Some(existing) => Err(StoreError::Conflict {
                project: asset.project.clone(),
                category: asset.category,
                digest,
                existing: *existing,
            }),
            None => Ok(()),
        }
    }

    /// Allocate a fresh identity (id, seq) for a new asset.
    pub(crate) fn allocate(&mut self) -> (AssetId, u64) {
        let mut id = AssetId::new();
        while self.assets.contains_key(&id) {
            id = AssetId::new();
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        (id, seq)
    }

    pub(crate) fn insert(&mut self, meta: AssetMeta) {
        if let Some(digest) = meta.digest {
            let key = (meta.project.clone(), meta.category, digest);
            if let Some(previous) = self.by_digest.insert(key, meta.id) {
                if previous != meta.id {
                    warn!(
                        previous = %previous,
                        replacement = %meta.id,
                        "digest index entry replaced"
                    );
                }
            }
        }
        self.next_seq = self.next_seq.max(meta.seq + 1);
        self.assets.insert(meta.id, meta);
    }

    pub(crate) fn remove(&mut self, id: &AssetId) -> Option<AssetMeta> {
        let meta = self.assets.remove(id)?;
        if let Some(digest) = meta.digest {
            let key = (meta.project.clone(), meta.category, digest);
            if self.by_digest.get(&key) == Some(id) {
                self.by_digest.remove(&key);
            }
        }
        Some(meta)
    }

    pub(crate) fn remove_project(&mut self, project: &ProjectName) -> Vec<AssetMeta> {
        let ids: Vec<AssetId> = self
            .assets
            .values()
            .filter(|meta| &meta.project == project)
            .map(|meta| meta.id)
            .collect();
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }

    pub(crate) fn list(&self, project: &ProjectName, category: Category) -> Vec<AssetMeta> {
        let mut result: Vec<AssetMeta> = self
            .assets
            .values()
            .filter(|meta| &meta.project == project && meta.category == category)
            .cloned()
            .collect();
        result.sort_by_key(|meta| meta.seq);
        result
    }

    pub(crate) fn find_by_digest(
        &self,
        project: &ProjectName,
        category: Category,
        digest: &ContentDigest,
    ) -> Option<AssetId> {
        self.by_digest
            .get(&(project.clone(), category, *digest))
            .copied()
    }

    /// All live metadata, in creation order.
    pub(crate) fn all(&self) -> Vec<AssetMeta> {
        let mut result: Vec<AssetMeta> = self.assets.values().cloned().collect();
        result.sort_by_key(|meta| meta.seq);
        result
    }

    /// Apply a journal record during replay.
    pub(crate) fn apply(&mut self, record: CatalogRecord) {
        match record {
            CatalogRecord::Put(meta) => self.insert(meta),
            CatalogRecord::Delete(id) => {
                self.remove(&id);
            }
            CatalogRecord::DeleteProject(project) => {
                self.remove_project(&project);
            }
        }
    }
}
