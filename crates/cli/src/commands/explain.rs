//! `kustsplit explain` — show where every document goes and which rules
//! matched it.

use kustsplit::{Source, build_plan, render_explanations, unplaced};
use kustsplit_core::TemplateEngine;
use kustsplit_package::{MiniJinjaEngine, Splitter};
use std::path::Path;
use std::sync::Arc;

pub async fn run(path: &Path, input: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(path)?;
    let engine: Arc<dyn TemplateEngine> = Arc::new(MiniJinjaEngine::new());
    let splitter = Splitter::with_engine(build_plan(&config), engine.clone())?;

    let source = Source::resolve(input, config.source(), &config.top_value(), engine.as_ref())?;
    let text = source.read().await?;

    let explained = splitter.explain(&text)?;
    print!("{}", render_explanations(splitter.rules().rules(), &explained));

    let errors = unplaced(&explained);
    if errors > 0 {
        return Err(format!("{errors} document(s) could not be placed").into());
    }
    Ok(())
}
