//! Per-project selection cursors.

use std::collections::BTreeMap;

use bk_types::{AssetId, ProjectName};
use serde::{Deserialize, Serialize};

/// What a cursor does when the asset it points at is deleted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Leave the project with no selection.
    Clear,
    /// Reassign to the most recently created remaining generated asset.
    #[default]
    MostRecent,
}

/// One optional selected asset per project.
///
/// This is plain bookkeeping. Validation against the store happens in
/// [`Session`](crate::Session).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionCursors {
    cursors: BTreeMap<ProjectName, AssetId>,
}

impl SelectionCursors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the project's cursor at `id`. Returns the previous selection.
    pub fn select(&mut self, project: &ProjectName, id: AssetId) -> Option<AssetId> {
        self.cursors.insert(project.clone(), id)
    }

    /// The recorded selection, unvalidated.
    pub fn current(&self, project: &ProjectName) -> Option<AssetId> {
        self.cursors.get(project).copied()
    }

    pub fn clear(&mut self, project: &ProjectName) -> Option<AssetId> {
        self.cursors.remove(project)
    }

    pub fn forget_project(&mut self, project: &ProjectName) {
        self.cursors.remove(project);
    }

    /// Projects whose cursor currently points at `id`.
    pub fn pointing_at(&self, id: &AssetId) -> Vec<ProjectName> {
        self.cursors
            .iter()
            .filter(|(_, selected)| *selected == id)
            .map(|(project, _)| project.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProjectName, &AssetId)> {
        self.cursors.iter()
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}
