use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use bk_crypto::ContentHasher;
use bk_types::{AssetId, Category, ContentDigest, ProjectName};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::asset::{AssetMeta, NewAsset};
use crate::catalog::Catalog;
use crate::error::{StoreError, StoreResult};
use crate::journal::{CatalogJournal, CatalogRecord, SyncMode};
use crate::traits::BlobStore;

const BLOBS_DIR: &str = "blobs";
const JOURNAL_FILENAME: &str = "catalog.log";
const BLOB_EXTENSION: &str = "bin";

/// Configuration for [`FileBlobStore`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// Journal and content sync strategy.
    pub sync_mode: SyncMode,
    /// Re-hash digest-bearing content on every read.
    pub verify_on_read: bool,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            sync_mode: SyncMode::default(),
            verify_on_read: true,
        }
    }
}

/// Durable blob store rooted at a directory.
///
/// Layout:
/// ```text
/// <root>/catalog.log          framed journal of catalog records
/// <root>/blobs/<asset-id>.bin content, written via temp file + rename
/// ```
///
/// The catalog is rebuilt from the journal on open. A `put` writes content
/// first and journals second, so a crash in between leaves at most an
/// orphan content file, which [`FileBlobStore::sweep_orphans`] removes.
/// A root directory must be owned by one process at a time.
pub struct FileBlobStore {
    root: PathBuf,
    blobs_dir: PathBuf,
    journal: CatalogJournal,
    catalog: RwLock<Catalog>,
    config: FileStoreConfig,
}

impl FileBlobStore {
    /// Open (or initialize) a store at `root`, replaying its journal.
    pub fn open(root: impl AsRef<Path>, config: FileStoreConfig) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        let blobs_dir = root.join(BLOBS_DIR);
        fs::create_dir_all(&blobs_dir).map_err(|e| {
            StoreError::StorageUnavailable(format!("cannot create {}: {e}", blobs_dir.display()))
        })?;

        let journal = CatalogJournal::open(&root.join(JOURNAL_FILENAME), config.sync_mode)?;
        let mut catalog = Catalog::new();
        for record in journal.replay()? {
            catalog.apply(record);
        }
        info!(root = %root.display(), assets = catalog.len(), "opened file blob store");

        Ok(Self {
            root,
            blobs_dir,
            journal,
            catalog: RwLock::new(catalog),
            config,
        })
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of live assets.
    pub fn len(&self) -> StoreResult<usize> {
        let catalog = self.catalog.read().map_err(|_| StoreError::poisoned("catalog"))?;
        Ok(catalog.len())
    }

    /// Returns `true` if the store holds no assets.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove content files that have no catalog entry, and stray temp files.
    ///
    /// Returns the number of files removed.
    pub fn sweep_orphans(&self) -> StoreResult<usize> {
        let catalog = self.catalog.read().map_err(|_| StoreError::poisoned("catalog"))?;
        let mut removed = 0;

        for entry in fs::read_dir(&self.blobs_dir)? {
            let path = entry?.path();
            let live = path
                .extension()
                .filter(|ext| *ext == BLOB_EXTENSION)
                .and_then(|_| path.file_stem())
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<AssetId>().ok())
                .is_some_and(|id| catalog.contains(&id));
            if live {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => {
                    warn!(path = %path.display(), "removed orphan content file");
                    removed += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(removed)
    }

    /// Rewrite the journal as one `Put` record per live asset.
    pub fn compact(&self) -> StoreResult<()> {
        let catalog = self.catalog.write().map_err(|_| StoreError::poisoned("catalog"))?;
        let records: Vec<CatalogRecord> =
            catalog.all().into_iter().map(CatalogRecord::Put).collect();
        self.journal.rewrite(&records)?;
        info!(assets = records.len(), "compacted catalog journal");
        Ok(())
    }

    fn content_path(&self, id: &AssetId) -> PathBuf {
        self.blobs_dir.join(format!("{id}.{BLOB_EXTENSION}"))
    }

    fn write_content(&self, id: &AssetId, content: &[u8]) -> StoreResult<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.blobs_dir)?;
        tmp.write_all(content)?;
        if self.config.sync_mode == SyncMode::EveryWrite {
            tmp.as_file().sync_all()?;
        }
        tmp.persist(self.content_path(id))
            .map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    fn remove_content(&self, id: &AssetId) {
        let path = self.content_path(id);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove content file"),
        }
    }
}

impl BlobStore for FileBlobStore {
    fn put(&self, asset: NewAsset) -> StoreResult<AssetId> {
        let mut catalog = self.catalog.write().map_err(|_| StoreError::poisoned("catalog"))?;
        catalog.check_unique(&asset)?;

        let (id, seq) = catalog.allocate();
        let meta = asset.to_meta(id, seq);

        self.write_content(&id, &asset.content)?;
        if let Err(e) = self.journal.append(&CatalogRecord::Put(meta.clone())) {
            self.remove_content(&id);
            return Err(e);
        }

        debug!(
            id = %id,
            project = %meta.project,
            category = %meta.category,
            size = meta.size,
            "put asset"
        );
        catalog.insert(meta);
        Ok(id)
    }

    fn list(&self, project: &ProjectName, category: Category) -> StoreResult<Vec<AssetMeta>> {
        let catalog = self.catalog.read().map_err(|_| StoreError::poisoned("catalog"))?;
        Ok(catalog.list(project, category))
    }

    fn get(&self, id: &AssetId) -> StoreResult<Vec<u8>> {
        let meta = {
            let catalog = self.catalog.read().map_err(|_| StoreError::poisoned("catalog"))?;
            catalog.get(id).cloned().ok_or(StoreError::NotFound(*id))?
        };

        let content = match fs::read(self.content_path(id)) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::CorruptObject {
                    id: *id,
                    reason: "content file missing".into(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        if self.config.verify_on_read {
            if let Some(expected) = meta.digest {
                if !ContentHasher::ASSET.verify(&content, &expected) {
                    return Err(StoreError::CorruptObject {
                        id: *id,
                        reason: format!("digest mismatch, expected {}", expected.short_hex()),
                    });
                }
            }
        }

        Ok(content)
    }

    fn meta(&self, id: &AssetId) -> StoreResult<Option<AssetMeta>> {
        let catalog = self.catalog.read().map_err(|_| StoreError::poisoned("catalog"))?;
        Ok(catalog.get(id).cloned())
    }

    fn find_by_digest(
        &self,
        project: &ProjectName,
        category: Category,
        digest: &ContentDigest,
    ) -> StoreResult<Option<AssetId>> {
        let catalog = self.catalog.read().map_err(|_| StoreError::poisoned("catalog"))?;
        Ok(catalog.find_by_digest(project, category, digest))
    }

    fn delete(&self, id: &AssetId) -> StoreResult<bool> {
        let mut catalog = self.catalog.write().map_err(|_| StoreError::poisoned("catalog"))?;
        if !catalog.contains(id) {
            return Ok(false);
        }

        self.journal.append(&CatalogRecord::Delete(*id))?;
        catalog.remove(id);
        self.remove_content(id);
        debug!(id = %id, "delete asset");
        Ok(true)
    }

    fn delete_all(&self, project: &ProjectName) -> StoreResult<usize> {
        let mut catalog = self.catalog.write().map_err(|_| StoreError::poisoned("catalog"))?;
        let has_assets = Category::ALL
            .iter()
            .any(|category| !catalog.list(project, *category).is_empty());
        if !has_assets {
            return Ok(0);
        }

        self.journal.append(&CatalogRecord::DeleteProject(project.clone()))?;
        let removed = catalog.remove_project(project);
        for meta in &removed {
            self.remove_content(&meta.id);
        }
        debug!(project = %project, removed = removed.len(), "delete project assets");
        Ok(removed.len())
    }
}

impl std::fmt::Debug for FileBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBlobStore")
            .field("root", &self.root)
            .field("asset_count", &self.len().ok())
            .finish()
    }
}
