//! Project name validation.
//!
//! Valid project names:
//! - Must be non-empty and at most [`MAX_PROJECT_NAME_LEN`] characters
//! - Must not start or end with whitespace
//! - Must not contain control characters, `/` or `\`
//! - Must not be `.` or `..`
//!
//! Names double as directory-safe keys for the file-backed stores, hence the
//! path separator restrictions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Maximum project name length in characters.
pub const MAX_PROJECT_NAME_LEN: usize = 64;

/// Characters that are forbidden anywhere in a project name.
const FORBIDDEN_CHARS: &[char] = &['/', '\\'];

/// A validated, user-visible project name.
///
/// The name is the project's identity; there is no separate surrogate key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectName(String);

impl ProjectName {
    /// Validate and wrap a project name.
    ///
    /// # Examples
    ///
    /// ```
    /// use bk_types::ProjectName;
    ///
    /// assert!(ProjectName::new("demo").is_ok());
    /// assert!(ProjectName::new("Spring Launch 2025").is_ok());
    /// assert!(ProjectName::new("").is_err());
    /// assert!(ProjectName::new("a/b").is_err());
    /// ```
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        validate_project_name(&name)?;
        Ok(Self(name))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validate a project name, returning `Ok(())` if valid.
pub fn validate_project_name(name: &str) -> Result<(), TypeError> {
    let invalid = |reason: &str| TypeError::InvalidProjectName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("project name must not be empty"));
    }

    if name.chars().count() > MAX_PROJECT_NAME_LEN {
        return Err(invalid(&format!(
            "must be at most {MAX_PROJECT_NAME_LEN} characters"
        )));
    }

    if name.trim() != name {
        return Err(invalid("must not start or end with whitespace"));
    }

    if let Some(ch) = name.chars().find(|c| c.is_control()) {
        return Err(invalid(&format!("contains control character: {ch:?}")));
    }

    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(invalid(&format!("contains forbidden character: {ch:?}")));
        }
    }

    if name == "." || name == ".." {
        return Err(invalid("must not be '.' or '..'"));
    }

    Ok(())
}

impl fmt::Debug for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProjectName({:?})", self.0)
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProjectName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ProjectName {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ProjectName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProjectName> for String {
    fn from(name: ProjectName) -> Self {
        name.0
    }
}
