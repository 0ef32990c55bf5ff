//! I/O glue around the kustsplit pipeline: turning a configuration into a
//! [`SplitPlan`](kustsplit_package::SplitPlan), resolving the input
//! stream, writing packages to disk, and the text reports of `explain`
//! and `check`.

pub mod diagnostics;
pub mod plan;
pub mod source;
pub mod writer;

pub use diagnostics::{descriptor_warnings, render_explanations, unplaced};
pub use plan::{OutputLayout, build_plan};
pub use source::{Source, SourceError};
pub use writer::{PackageWrite, WriteError, WriteReport, Writer};
