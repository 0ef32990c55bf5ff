//! Packages — named groups of documents plus their descriptor.

use crate::identity::ResourceIdentity;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static PACKAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("package name pattern is valid")
});

/// Check that `name` can be used as a package name (and directory name).
pub fn validate_package_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("package name is empty".into());
    }
    if !PACKAGE_NAME.is_match(name) {
        return Err(format!(
            "package name '{name}' must start with a letter or digit and contain only letters, digits, '.', '_' or '-'"
        ));
    }
    Ok(())
}

/// A member of a package. Refers to its document by stream index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Stream index of the document.
    pub document: usize,

    /// Identity of the document, kept for descriptor bindings.
    pub identity: ResourceIdentity,

    /// Output file name, unique within the package.
    pub file_name: String,
}

/// A named output unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,

    /// Members in input-stream order.
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member file names in order.
    pub fn file_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.file_name.as_str()).collect()
    }

    /// Stream indices of the members in order.
    pub fn document_indices(&self) -> Vec<usize> {
        self.members.iter().map(|m| m.document).collect()
    }
}
