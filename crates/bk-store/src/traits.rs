use bk_types::{AssetId, Category, ContentDigest, ProjectName};

use crate::asset::{AssetMeta, NewAsset};
use crate::error::StoreResult;

/// Project-scoped asset store.
///
/// All implementations must satisfy these invariants:
/// - Assets are immutable once written. Edits produce new assets.
/// - Identifiers are freshly allocated on every successful `put` and never
///   reused after deletion.
/// - Within one (project, category) at most one digest-bearing asset exists
///   per digest. A colliding `put` fails with `Conflict` and writes nothing.
/// - Deletion is idempotent: removing something already gone is not an error.
/// - The store does not check that the project exists; callers own that
///   check (see the studio facade).
pub trait BlobStore: Send + Sync {
    /// Store a new asset and return its freshly assigned identifier.
    fn put(&self, asset: NewAsset) -> StoreResult<AssetId>;

    /// List asset metadata for one project and category in creation order.
    fn list(&self, project: &ProjectName, category: Category) -> StoreResult<Vec<AssetMeta>>;

    /// Read an asset's content. Fails with `NotFound` for unknown ids.
    fn get(&self, id: &AssetId) -> StoreResult<Vec<u8>>;

    /// Read an asset's metadata. Returns `Ok(None)` if it does not exist.
    fn meta(&self, id: &AssetId) -> StoreResult<Option<AssetMeta>>;

    /// Find the digest-bearing asset with the given digest in a scope.
    fn find_by_digest(
        &self,
        project: &ProjectName,
        category: Category,
        digest: &ContentDigest,
    ) -> StoreResult<Option<AssetId>>;

    /// Delete an asset. Returns `true` if it existed.
    fn delete(&self, id: &AssetId) -> StoreResult<bool>;

    /// Delete every asset of a project in both categories. Returns the count.
    fn delete_all(&self, project: &ProjectName) -> StoreResult<usize>;

    /// Most recently created asset with the given display name.
    fn find_by_name(
        &self,
        project: &ProjectName,
        category: Category,
        filename: &str,
    ) -> StoreResult<Option<AssetMeta>> {
        Ok(self
            .list(project, category)?
            .into_iter()
            .rev()
            .find(|meta| meta.filename == filename))
    }

    /// Check whether an asset exists.
    fn exists(&self, id: &AssetId) -> StoreResult<bool> {
        Ok(self.meta(id)?.is_some())
    }

    /// Most recently created asset in a scope, if any.
    fn latest(&self, project: &ProjectName, category: Category) -> StoreResult<Option<AssetMeta>> {
        Ok(self.list(project, category)?.pop())
    }
}
