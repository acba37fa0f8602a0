//! Registry record types.

use bk_types::ProjectName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Unique, validated project name.
    pub name: ProjectName,
    /// When the project was created.
    pub created_at: DateTime<Utc>,
}

impl ProjectRecord {
    /// A record for a project created now.
    pub fn new(name: ProjectName) -> Self {
        Self {
            name,
            created_at: Utc::now(),
        }
    }
}
