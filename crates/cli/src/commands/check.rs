//! `kustsplit check` — validate a configuration and compile its templates.

use kustsplit::{build_plan, descriptor_warnings};
use kustsplit_core::TemplateEngine;
use kustsplit_package::{MiniJinjaEngine, Splitter};
use std::path::Path;
use std::sync::Arc;

pub async fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(path)?;
    let engine: Arc<dyn TemplateEngine> = Arc::new(MiniJinjaEngine::new());
    let splitter = Splitter::with_engine(build_plan(&config), engine.clone())
        .map_err(|e| format!("Invalid configuration {}: {e}", path.display()))?;

    println!("Configuration {} is valid.\n", path.display());
    if let Some(name) = config.top.get("name").and_then(|v| v.as_str()) {
        println!("  Name:        {name}");
    }
    if let Some(source) = config.source() {
        println!("  Source:      {source}");
    }
    println!(
        "  Default:     {}",
        splitter.rules().default_package().unwrap_or("(none, unmatched documents fail)")
    );
    println!("  Ignore case: {}", config.ignore_case);
    println!("  Normalize:   {}", config.normalize);
    println!("  Layout:      {}/{}", config.naming.package_path, config.descriptor.filename);

    let rules = splitter.rules().rules();
    println!("\nRules ({}):", rules.len());
    for (i, rule) in rules.iter().enumerate() {
        let field = |name: &str, value: &Option<String>| {
            value.as_ref().map(|v| format!("{name}={v}"))
        };
        let constraints: Vec<String> = [
            field("kind", &rule.matcher.kind),
            field("name", &rule.matcher.name),
            field("namespace", &rule.matcher.namespace),
        ]
        .into_iter()
        .flatten()
        .collect();
        let matcher = if constraints.is_empty() {
            "*".to_string()
        } else {
            constraints.join(", ")
        };
        println!("  #{i} [{matcher}] -> {}", rule.package);
        if !rule.description.is_empty() {
            println!("     {}", rule.description);
        }
    }

    let warnings = descriptor_warnings(splitter.renderer().templates(), engine.as_ref());
    if !warnings.is_empty() {
        println!("\nWarnings ({}):", warnings.len());
        for warning in &warnings {
            println!("  {warning}");
        }
        println!("  Packages using these templates will fail to render their descriptor.");
    }
    Ok(())
}
