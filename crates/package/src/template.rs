//! MiniJinja-backed [`TemplateEngine`].
//!
//! Configured for YAML output: block tags swallow their own line
//! (`trim_blocks` + `lstrip_blocks`), the final newline of a template is
//! kept, and referencing an unbound variable is an error rather than an
//! empty string.

use kustsplit_core::{TemplateEngine, TemplateError};
use minijinja::{Environment, ErrorKind, UndefinedBehavior};

/// Template engine used by every stage of a run.
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.add_filter("pad3", pad3);
        Self { env }
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn name(&self) -> &str {
        "minijinja"
    }

    fn render(
        &self,
        template: &str,
        bindings: &serde_json::Value,
    ) -> Result<String, TemplateError> {
        if !bindings.is_object() {
            return Err(TemplateError::Bindings(
                "bindings must be a JSON object".into(),
            ));
        }
        self.env.render_str(template, bindings).map_err(convert)
    }

    fn check(&self, template: &str) -> Result<(), TemplateError> {
        // Compiling borrows the source for the environment's lifetime, so
        // syntax is checked in a scratch environment with the same syntax
        // settings.
        let mut scratch = Environment::new();
        scratch.set_trim_blocks(true);
        scratch.set_lstrip_blocks(true);
        scratch
            .template_from_str(template)
            .map(|_| ())
            .map_err(convert)
    }
}

fn convert(err: minijinja::Error) -> TemplateError {
    match err.kind() {
        ErrorKind::SyntaxError => TemplateError::Syntax(err.to_string()),
        _ => TemplateError::Render(err.to_string()),
    }
}

/// `{{ 7 | pad3 }}` → `007`.
fn pad3(value: u64) -> String {
    format!("{value:03}")
}
