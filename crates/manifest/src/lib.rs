//! Document parser — turns a multi-document manifest stream into an
//! ordered sequence of [`ResourceDocument`]s.
//!
//! ```text
//! raw text ──▶ Chunks (split on `---` / `...`) ──▶ serde_yaml::Value ──▶ ResourceDocument
//!                                                   (merge keys applied)   {index, identity, body}
//! ```
//!
//! Only `kind`, `metadata.name` and `metadata.namespace` are read; the
//! rest of each manifest is passed through untouched.

mod parser;
mod splitter;

pub use parser::{Documents, ParseOptions, parse_all, parse_stream};

pub use kustsplit_core::ResourceDocument;
