//! The [`ProjectRegistry`] trait defining the registry storage interface.

use bk_types::ProjectName;

use crate::error::Result;
use crate::types::ProjectRecord;

/// Storage backend for the set of known projects.
///
/// Implementations must be thread-safe (`Send + Sync`). Names are validated
/// by construction of [`ProjectName`], so backends never see an invalid one.
pub trait ProjectRegistry: Send + Sync {
    /// Register a new project.
    ///
    /// Fails with `AlreadyExists` if the name is taken.
    fn create(&self, name: &ProjectName) -> Result<ProjectRecord>;

    /// Look up a project by name. Returns `Ok(None)` if it is unknown.
    fn get(&self, name: &ProjectName) -> Result<Option<ProjectRecord>>;

    /// All projects ordered by name.
    fn list(&self) -> Result<Vec<ProjectRecord>>;

    /// Remove a project record.
    ///
    /// Returns `Ok(true)` if it existed, `Ok(false)` if it did not.
    fn delete(&self, name: &ProjectName) -> Result<bool>;

    /// Check whether a project is registered.
    fn exists(&self, name: &ProjectName) -> Result<bool> {
        Ok(self.get(name)?.is_some())
    }
}
