use std::collections::HashMap;
use std::sync::RwLock;

use bk_types::{AssetId, Category, ContentDigest, ProjectName};
use tracing::debug;

use crate::asset::{AssetMeta, NewAsset};
use crate::catalog::Catalog;
use crate::error::{StoreError, StoreResult};
use crate::traits::BlobStore;

#[derive(Default)]
struct Inner {
    catalog: Catalog,
    content: HashMap<AssetId, Vec<u8>>,
}

/// In-memory blob store.
///
/// Intended for tests, embedding, and the ephemeral studio. Catalog and
/// content live behind one `RwLock`, so the uniqueness check and the insert
/// of a `put` happen atomically.
pub struct InMemoryBlobStore {
    inner: RwLock<Inner>,
}

impl InMemoryBlobStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Number of assets currently stored.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.catalog.len())
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Total content bytes across all stored assets.
    pub fn total_bytes(&self) -> StoreResult<u64> {
        Ok(self.read()?.content.values().map(|c| c.len() as u64).sum())
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| StoreError::poisoned("memory store"))
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, asset: NewAsset) -> StoreResult<AssetId> {
        let mut inner = self.inner.write().map_err(|_| StoreError::poisoned("store"))?;
        inner.catalog.check_unique(&asset)?;

        let (id, seq) = inner.catalog.allocate();
        let meta = asset.to_meta(id, seq);
        debug!(
            id = %id,
            project = %meta.project,
            category = %meta.category,
            size = meta.size,
            "put asset"
        );
        inner.catalog.insert(meta);
        inner.content.insert(id, asset.content);
        Ok(id)
    }

    fn list(&self, project: &ProjectName, category: Category) -> StoreResult<Vec<AssetMeta>> {
        let inner = self.inner.read().map_err(|_| StoreError::poisoned("store"))?;
        Ok(inner.catalog.list(project, category))
    }

    fn get(&self, id: &AssetId) -> StoreResult<Vec<u8>> {
        let inner = self.inner.read().map_err(|_| StoreError::poisoned("store"))?;
        inner.content.get(id).cloned().ok_or(StoreError::NotFound(*id))
    }

    fn meta(&self, id: &AssetId) -> StoreResult<Option<AssetMeta>> {
        let inner = self.inner.read().map_err(|_| StoreError::poisoned("store"))?;
        Ok(inner.catalog.get(id).cloned())
    }

    fn find_by_digest(
        &self,
        project: &ProjectName,
        category: Category,
        digest: &ContentDigest,
    ) -> StoreResult<Option<AssetId>> {
        let inner = self.inner.read().map_err(|_| StoreError::poisoned("store"))?;
        Ok(inner.catalog.find_by_digest(project, category, digest))
    }

    fn delete(&self, id: &AssetId) -> StoreResult<bool> {
        let mut inner = self.inner.write().map_err(|_| StoreError::poisoned("store"))?;
        inner.content.remove(id);
        let existed = inner.catalog.remove(id).is_some();
        debug!(id = %id, existed, "delete asset");
        Ok(existed)
    }

    fn delete_all(&self, project: &ProjectName) -> StoreResult<usize> {
        let mut inner = self.inner.write().map_err(|_| StoreError::poisoned("store"))?;
        let removed = inner.catalog.remove_project(project);
        for meta in &removed {
            inner.content.remove(&meta.id);
        }
        debug!(project = %project, removed = removed.len(), "delete project assets");
        Ok(removed.len())
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("asset_count", &self.len().ok())
            .finish()
    }
}
