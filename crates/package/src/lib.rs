//! Package assembly for kustsplit.
//!
//! Takes the placed documents of a manifest stream, names each one,
//! groups them into packages and renders one descriptor per package.
//!
//! ```text
//! stream ──▶ parse ──▶ place (rules) ──▶ Assembler ──▶ Renderer ──▶ SplitOutcome
//!                                        (naming,      (descriptor
//!                                         collisions)   per package)
//! ```
//!
//! The whole pipeline is driven by a [`SplitPlan`]:
//!
//! ```rust,no_run
//! use kustsplit_package::{SplitPlan, Splitter};
//!
//! let splitter = Splitter::new(SplitPlan {
//!     default_package: Some("misc".into()),
//!     ..SplitPlan::default()
//! })?;
//! let outcome = splitter.run("kind: Service\nmetadata:\n  name: web\n")?;
//! for package in outcome.package_contents() {
//!     println!("{} ({} files)", package.name, package.files.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod assembler;
pub mod naming;
pub mod pipeline;
pub mod render;
pub mod template;

pub use assembler::{Assembler, Assembly};
pub use naming::{
    DEFAULT_FILE_TEMPLATE, NameRequest, NamingPolicy, TemplateNaming, validate_file_name,
};
pub use pipeline::{Explanation, PackageContents, Partition, SplitOutcome, SplitPlan, Splitter};
pub use render::{DEFAULT_DESCRIPTOR_TEMPLATE, DescriptorTemplates, RenderReport, Renderer};
pub use template::MiniJinjaEngine;

/// Errors raised while compiling a [`SplitPlan`].
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error(transparent)]
    Rules(#[from] kustsplit_rules::RuleError),

    #[error("{what} is not a valid template: {detail}")]
    Template { what: String, detail: String },
}
