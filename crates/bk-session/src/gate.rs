//! Upload deduplication gate.
//!
//! The gate sits in front of a [`BlobStore`] and turns "store these bytes"
//! into "store these bytes unless this project already has them". The
//! store's own uniqueness check is the final word: when two uploads race,
//! the loser's `put` fails with `Conflict` and the gate resolves it to the
//! winner's identifier.

use bk_crypto::ContentHasher;
use bk_store::{BlobStore, NewAsset, StoreError};
use bk_types::{AssetId, Category, ProjectName};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{SessionError, SessionResult};
use crate::processed::ProcessedUploads;

/// Outcome of admitting an upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
    /// The asset holding the uploaded content.
    pub id: AssetId,
    /// `true` if this call created the asset, `false` if it already existed.
    pub created: bool,
}

impl Admission {
    fn existing(id: AssetId) -> Self {
        Self { id, created: false }
    }
}

/// Admits uploads into a store at most once per (project, category, digest).
pub struct DedupGate<'a> {
    store: &'a dyn BlobStore,
}

impl<'a> DedupGate<'a> {
    pub fn new(store: &'a dyn BlobStore) -> Self {
        Self { store }
    }

    /// Admit `content` into `project`/`category`.
    ///
    /// Returns the existing asset when identical content is already stored
    /// in that scope, otherwise stores it. Only deduplicated categories are
    /// accepted.
    pub fn admit(
        &self,
        processed: &mut ProcessedUploads,
        project: &ProjectName,
        category: Category,
        filename: &str,
        content: Vec<u8>,
    ) -> SessionResult<Admission> {
        if !category.is_deduplicated() {
            return Err(SessionError::CategoryNotDeduplicated(category));
        }

        let digest = ContentHasher::ASSET.hash(&content);

        if let Some(id) = processed.get(project, category, &digest) {
            if self.store.exists(&id)? {
                debug!(id = %id, filename, "upload already processed in this session");
                return Ok(Admission::existing(id));
            }
            debug!(id = %id, filename, "processed upload was deleted elsewhere");
            processed.forget_asset(&id);
        }

        if let Some(id) = self.store.find_by_digest(project, category, &digest)? {
            debug!(id = %id, filename, "upload matches stored asset");
            processed.remember(project, category, digest, id);
            return Ok(Admission::existing(id));
        }

        let asset = NewAsset {
            project: project.clone(),
            category,
            filename: filename.to_string(),
            content,
            digest: Some(digest),
        };

        let mut retries_left = 1;
        loop {
            match self.store.put(asset.clone()) {
                Ok(id) => {
                    processed.remember(project, category, digest, id);
                    info!(
                        id = %id,
                        project = %project,
                        digest = %digest.short_hex(),
                        filename,
                        "upload admitted"
                    );
                    return Ok(Admission { id, created: true });
                }
                Err(err @ StoreError::Conflict { .. }) => {
                    if let Some(winner) = self.store.find_by_digest(project, category, &digest)? {
                        debug!(id = %winner, filename, "lost upload race; using winner");
                        processed.remember(project, category, digest, winner);
                        return Ok(Admission::existing(winner));
                    }
                    if retries_left == 0 {
                        return Err(err.into());
                    }
                    retries_left -= 1;
                    warn!(filename, "conflicting upload vanished; retrying put");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
