//! Resource identity — the kind/name/namespace triple of a manifest.
//!
//! Matching, file naming and descriptor rendering only ever look at
//! these three fields; the rest of a manifest is opaque to the core.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The identification triple of one manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentity {
    /// Top-level `kind` (e.g. `Deployment`).
    pub kind: String,

    /// `metadata.name`.
    pub name: String,

    /// `metadata.namespace`; `None` for cluster-scoped resources.
    #[serde(default)]
    pub namespace: Option<String>,
}

impl ResourceIdentity {
    pub fn new(kind: impl Into<String>, name: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            namespace: namespace.filter(|ns| !ns.is_empty()).map(String::from),
        }
    }

    /// Namespace as a plain string; empty when the resource has none.
    pub fn namespace_str(&self) -> &str {
        self.namespace.as_deref().unwrap_or("")
    }

    /// JSON view used as template bindings (`kind`, `name`, `namespace`).
    ///
    /// The namespace is always present, as an empty string for
    /// cluster-scoped resources, so templates never trip over an
    /// undefined value.
    pub fn to_bindings(&self) -> serde_json::Value {
        serde_json::json!({
            "kind": self.kind,
            "name": self.name,
            "namespace": self.namespace_str(),
        })
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}/{}", self.kind, ns, self.name),
            None => write!(f, "{}/{}", self.kind, self.name),
        }
    }
}
