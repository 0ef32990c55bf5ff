//! A single manifest document cut out of a multi-document stream.

use crate::identity::ResourceIdentity;
use serde::{Deserialize, Serialize};

/// One parsed manifest. Immutable once produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDocument {
    /// Zero-based position among the non-empty documents of the stream.
    pub index: usize,

    /// Identification triple extracted from the manifest.
    pub identity: ResourceIdentity,

    /// Text written to the member file.
    pub body: String,
}

impl ResourceDocument {
    pub fn new(index: usize, identity: ResourceIdentity, body: impl Into<String>) -> Self {
        Self {
            index,
            identity,
            body: body.into(),
        }
    }
}
