//! In-memory project registry for testing and ephemeral use.

use std::collections::BTreeMap;
use std::sync::RwLock;

use bk_types::ProjectName;
use tracing::debug;

use crate::error::{RegistryError, Result};
use crate::traits::ProjectRegistry;
use crate::types::ProjectRecord;

/// An in-memory implementation of [`ProjectRegistry`].
///
/// Records live in a `BTreeMap` behind a `RwLock`, so listing is ordered by
/// name without an extra sort. Data is lost when the registry is dropped.
#[derive(Debug, Default)]
pub struct InMemoryProjectRegistry {
    projects: RwLock<BTreeMap<ProjectName, ProjectRecord>>,
}

impl InMemoryProjectRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectRegistry for InMemoryProjectRegistry {
    fn create(&self, name: &ProjectName) -> Result<ProjectRecord> {
        let mut projects = self.projects.write().map_err(|_| RegistryError::poisoned())?;
        if projects.contains_key(name) {
            return Err(RegistryError::AlreadyExists { name: name.clone() });
        }
        let record = ProjectRecord::new(name.clone());
        projects.insert(name.clone(), record.clone());
        debug!(project = %name, "project created");
        Ok(record)
    }

    fn get(&self, name: &ProjectName) -> Result<Option<ProjectRecord>> {
        let projects = self.projects.read().map_err(|_| RegistryError::poisoned())?;
        Ok(projects.get(name).cloned())
    }

    fn list(&self) -> Result<Vec<ProjectRecord>> {
        let projects = self.projects.read().map_err(|_| RegistryError::poisoned())?;
        Ok(projects.values().cloned().collect())
    }

    fn delete(&self, name: &ProjectName) -> Result<bool> {
        let mut projects = self.projects.write().map_err(|_| RegistryError::poisoned())?;
        let existed = projects.remove(name).is_some();
        debug!(project = %name, existed, "project deleted");
        Ok(existed)
    }
}
