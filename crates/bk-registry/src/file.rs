//! File-backed project registry.
//!
//! The full record set is kept in memory and written to `projects.json` on
//! every mutation. Writes go to a temporary file in the same directory and
//! are renamed over the old file, so readers never observe a partial write.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use bk_types::ProjectName;
use tracing::{debug, info};

use crate::error::{RegistryError, Result};
use crate::traits::ProjectRegistry;
use crate::types::ProjectRecord;

const REGISTRY_FILENAME: &str = "projects.json";

/// A [`ProjectRegistry`] persisted as JSON under a root directory.
#[derive(Debug)]
pub struct FileProjectRegistry {
    path: PathBuf,
    projects: RwLock<BTreeMap<ProjectName, ProjectRecord>>,
}

impl FileProjectRegistry {
    /// Open the registry stored under `root`, creating the directory if needed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;
        let path = root.join(REGISTRY_FILENAME);

        let projects = match fs::read(&path) {
            Ok(bytes) => {
                let records: Vec<ProjectRecord> = serde_json::from_slice(&bytes)
                    .map_err(|e| RegistryError::Serialization(e.to_string()))?;
                records.into_iter().map(|r| (r.name.clone(), r)).collect()
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), projects = projects.len(), "opened project registry");

        Ok(Self {
            path,
            projects: RwLock::new(projects),
        })
    }

    /// Path of the backing JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, projects: &BTreeMap<ProjectName, ProjectRecord>) -> Result<()> {
        let records: Vec<&ProjectRecord> = projects.values().collect();
        let json = serde_json::to_vec_pretty(&records)
            .map_err(|e| RegistryError::Serialization(e.to_string()))?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| RegistryError::Io(e.error))?;
        debug!(path = %self.path.display(), projects = records.len(), "registry persisted");
        Ok(())
    }
}

impl ProjectRegistry for FileProjectRegistry {
    fn create(&self, name: &ProjectName) -> Result<ProjectRecord> {
        let mut projects = self.projects.write().map_err(|_| RegistryError::poisoned())?;
        if projects.contains_key(name) {
            return Err(RegistryError::AlreadyExists { name: name.clone() });
        }

        let record = ProjectRecord::new(name.clone());
        let mut next = projects.clone();
        next.insert(name.clone(), record.clone());
        self.persist(&next)?;
        *projects = next;
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
        if !projects.contains_key(name) {
            return Ok(false);
        }

        let mut next = projects.clone();
        next.remove(name);
        self.persist(&next)?;
        *projects = next;
        Ok(true)
    }
}
