//! Error types for the kustsplit domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Structural errors (the partition itself is invalid) abort a run;
//! per-package errors are collected and reported at the end.

use crate::identity::ResourceIdentity;
use thiserror::Error;

/// The error type for every stage of a split run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    // --- Parsing ---
    #[error("Malformed document #{index}: {reason}")]
    MalformedDocument { index: usize, reason: String },

    // --- Matching ---
    #[error("Document #{index} ({identity}) matched no rule and no default package is configured")]
    UnmatchedDocument {
        index: usize,
        identity: ResourceIdentity,
    },

    #[error("Rule #{rule} resolved an invalid package name: {reason}")]
    InvalidTarget { rule: usize, reason: String },

    // --- Assembly ---
    #[error("Could not name document #{index}: {reason}")]
    InvalidFileName { index: usize, reason: String },

    #[error(
        "Duplicate file name '{file_name}' in package '{package}' (documents #{first} and #{second})"
    )]
    DuplicateFileName {
        package: String,
        file_name: String,
        first: usize,
        second: usize,
    },

    // --- Rendering ---
    #[error("Descriptor for package '{package}' failed to render: {reason}")]
    TemplateRender { package: String, reason: String },
}

impl SplitError {
    /// Whether this error invalidates the whole run.
    ///
    /// Duplicate file names only poison their own package and template
    /// failures only cost a descriptor, so neither is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SplitError::DuplicateFileName { .. } | SplitError::TemplateRender { .. }
        )
    }

    /// The package this error is scoped to, if any.
    pub fn package(&self) -> Option<&str> {
        match self {
            SplitError::DuplicateFileName { package, .. }
            | SplitError::TemplateRender { package, .. } => Some(package),
            _ => None,
        }
    }
}

/// Result type alias using [`SplitError`].
pub type Result<T> = std::result::Result<T, SplitError>;

/// Error returned by a [`TemplateEngine`](crate::template::TemplateEngine).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template syntax error: {0}")]
    Syntax(String),

    #[error("template evaluation failed: {0}")]
    Render(String),

    #[error("invalid template bindings: {0}")]
    Bindings(String),
}
