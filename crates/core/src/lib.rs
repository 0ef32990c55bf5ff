//! # kustsplit Core
//!
//! Domain types, traits, and error definitions for the kustsplit manifest
//! splitter. This crate has **no framework dependencies**; it defines the
//! domain model that the parser, matcher, assembler and renderer crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Capabilities the core only consumes (template evaluation) are traits
//! here. Implementations live in their respective crates, so the matching
//! and assembly logic can be tested with stub engines.

pub mod document;
pub mod error;
pub mod identity;
pub mod package;
pub mod template;

// Re-export key types at crate root for ergonomics
pub use document::ResourceDocument;
pub use error::{Result, SplitError, TemplateError};
pub use identity::ResourceIdentity;
pub use package::{Member, Package, validate_package_name};
pub use template::{TemplateEngine, is_templated};
