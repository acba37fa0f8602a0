//! The explicit session value.
//!
//! A [`Session`] carries what a front end would otherwise keep as global
//! state: the active project, one selection cursor per project, and the
//! processed-upload memo. Every operation that reads or mutates it takes it
//! by reference, so independent sessions never interfere.

use bk_store::BlobStore;
use bk_types::{AssetId, Category, ProjectName};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cursor::{FallbackPolicy, SelectionCursors};
use crate::error::{SessionError, SessionResult};
use crate::gate::{Admission, DedupGate};
use crate::processed::ProcessedUploads;

/// Per-user working state.
///
/// Serializes the active project and the cursors. The fallback policy comes
/// from configuration and the processed set is rebuilt on demand, so neither
/// is persisted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    active: Option<ProjectName>,
    #[serde(default)]
    cursors: SelectionCursors,
    #[serde(skip)]
    fallback: FallbackPolicy,
    #[serde(skip)]
    processed: ProcessedUploads,
}

impl Session {
    pub fn new(fallback: FallbackPolicy) -> Self {
        Self {
            fallback,
            ..Self::default()
        }
    }

    /// A session with `project` already active.
    pub fn for_project(project: ProjectName, fallback: FallbackPolicy) -> Self {
        Self {
            active: Some(project),
            ..Self::new(fallback)
        }
    }

    pub fn active(&self) -> Option<&ProjectName> {
        self.active.as_ref()
    }

    /// The active project, or `NoActiveProject`.
    pub fn require_active(&self) -> SessionResult<&ProjectName> {
        self.active.as_ref().ok_or(SessionError::NoActiveProject)
    }

    /// Make `project` active. Its cursor is whatever it was when last active.
    pub fn switch_to(&mut self, project: ProjectName) {
        debug!(project = %project, "switch active project");
        self.active = Some(project);
    }

    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }

    pub fn set_fallback(&mut self, fallback: FallbackPolicy) {
        self.fallback = fallback;
    }

    pub fn cursors(&self) -> &SelectionCursors {
        &self.cursors
    }

    pub fn processed(&self) -> &ProcessedUploads {
        &self.processed
    }

    /// Admit a reference upload into the active project.
    pub fn admit_reference(
        &mut self,
        store: &dyn BlobStore,
        filename: &str,
        content: Vec<u8>,
    ) -> SessionResult<Admission> {
        let project = self.require_active()?.clone();
        DedupGate::new(store).admit(
            &mut self.processed,
            &project,
            Category::Reference,
            filename,
            content,
        )
    }

    /// Select a generated asset of the active project.
    pub fn select(&mut self, store: &dyn BlobStore, id: AssetId) -> SessionResult<()> {
        let project = self.require_active()?.clone();
        let meta = store.meta(&id)?.ok_or(SessionError::NotFound(id))?;

        if meta.project != project {
            return Err(SessionError::WrongProject {
                id,
                expected: project,
                actual: meta.project,
            });
        }
        if meta.category != Category::Generated {
            return Err(SessionError::WrongCategory {
                id,
                actual: meta.category,
            });
        }

        self.cursors.select(&project, id);
        debug!(project = %project, id = %id, "selected asset");
        Ok(())
    }

    /// The validated selection of the active project.
    pub fn current(&mut self, store: &dyn BlobStore) -> SessionResult<Option<AssetId>> {
        let project = self.require_active()?.clone();
        self.current_in(store, &project)
    }

    /// The validated selection of any project.
    ///
    /// If the selected asset no longer exists (deleted by another session or
    /// process), the cursor is repaired per the fallback policy first.
    pub fn current_in(
        &mut self,
        store: &dyn BlobStore,
        project: &ProjectName,
    ) -> SessionResult<Option<AssetId>> {
        let Some(id) = self.cursors.current(project) else {
            return Ok(None);
        };

        match store.meta(&id)? {
            Some(meta) if &meta.project == project && meta.category == Category::Generated => {
                Ok(Some(id))
            }
            _ => {
                warn!(project = %project, id = %id, "selected asset vanished; repairing cursor");
                self.repair(store, project)
            }
        }
    }

    /// Update session state after `id` was deleted from the store.
    pub fn on_delete(&mut self, store: &dyn BlobStore, id: &AssetId) -> SessionResult<()> {
        self.processed.forget_asset(id);
        for project in self.cursors.pointing_at(id) {
            self.repair(store, &project)?;
        }
        Ok(())
    }

    /// Drop all state of a deleted project.
    pub fn on_project_deleted(&mut self, project: &ProjectName) {
        self.cursors.forget_project(project);
        self.processed.forget_project(project);
        if self.active.as_ref() == Some(project) {
            self.active = None;
        }
    }

    fn repair(
        &mut self,
        store: &dyn BlobStore,
        project: &ProjectName,
    ) -> SessionResult<Option<AssetId>> {
        self.cursors.clear(project);
        let replacement = match self.fallback {
            FallbackPolicy::Clear => None,
            FallbackPolicy::MostRecent => store
                .latest(project, Category::Generated)?
                .map(|meta| meta.id),
        };
        if let Some(id) = replacement {
            self.cursors.select(project, id);
        }
        debug!(project = %project, replacement = ?replacement, "cursor repaired");
        Ok(replacement)
    }
}
