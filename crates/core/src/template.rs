//! Template capability.
//!
//! The core never implements a template language. Everything that needs
//! one (target names, file names, descriptors) goes through this trait,
//! and the concrete engine is chosen by the crate wiring the pipeline.

use crate::error::TemplateError;

/// A pure function of `(template, bindings) -> text`.
///
/// Implementations must be deterministic and free of shared mutable
/// state; the descriptor stage calls `render` from several threads.
pub trait TemplateEngine: Send + Sync {
    /// Human-readable engine name (for diagnostics).
    fn name(&self) -> &str;

    /// Render `template` against `bindings` (a JSON object).
    fn render(
        &self,
        template: &str,
        bindings: &serde_json::Value,
    ) -> std::result::Result<String, TemplateError>;

    /// Check a template for syntax errors without rendering it.
    fn check(&self, template: &str) -> std::result::Result<(), TemplateError>;
}

/// Whether a string contains template syntax and must be rendered.
pub fn is_templated(s: &str) -> bool {
    s.contains("{{") || s.contains("{%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_template_syntax() {
        assert!(is_templated("ns-{{ namespace }}"));
        assert!(is_templated("{% if kind %}x{% endif %}"));
        assert!(!is_templated("workloads"));
        assert!(!is_templated("braces-{single}"));
    }
}
