//! Split rules — declarative package placement for manifest documents.
//!
//! Rules let users decide which package each document of a stream lands
//! in, based on the document's kind, name and namespace. They are
//! evaluated top to bottom and the **first** matching rule wins.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │   Document   │───▶│  RuleEngine  │───▶│  Assembler   │
//! │  (identity)  │    │              │    │              │
//! └──────────────┘    └──────────────┘    └──────────────┘
//!                           │
//!                     ┌─────┴──────┐
//!                     │ Placement  │
//!                     │ rule #n    │
//!                     │ or default │
//!                     └────────────┘
//! ```
//!
//! # Example Rules
//!
//! ```yaml
//! rules:
//!   - match:
//!       kind: CustomResourceDefinition
//!     package: crd
//!   - match:
//!       namespace: kube-system
//!     package: "system-{{ kind | lower }}"
//! ```

mod engine;
mod model;

pub use engine::{Placement, RuleEngine};
pub use model::{Matcher, RuleSet, SplitRule};

/// Errors raised while building a rule engine.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("invalid rule #{position}: {reason}")]
    InvalidRule { position: usize, reason: String },

    #[error("package target of rule #{position} is not a valid template: {detail}")]
    TargetSyntax { position: usize, detail: String },

    #[error("invalid default package: {0}")]
    InvalidDefault(String),
}
