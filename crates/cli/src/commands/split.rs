//! `kustsplit split` — split a manifest stream and write the packages.

use kustsplit::{OutputLayout, Source, Writer, build_plan};
use kustsplit_core::TemplateEngine;
use kustsplit_package::{MiniJinjaEngine, Splitter};
use std::path::PathBuf;
use std::sync::Arc;

pub struct SplitArgs {
    pub config: PathBuf,
    pub input: Option<String>,
    pub out: PathBuf,
    pub dry_run: bool,
    pub force: bool,
    pub concurrent: bool,
}

pub async fn run(args: SplitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(&args.config)?;
    let engine: Arc<dyn TemplateEngine> = Arc::new(MiniJinjaEngine::new());
    let splitter = Splitter::with_engine(build_plan(&config), engine.clone())?;

    let top = config.top_value();
    let source = Source::resolve(args.input.as_deref(), config.source(), &top, engine.as_ref())?;
    tracing::info!(%source, "Reading manifest stream");
    let input = source.read().await?;

    let outcome = if args.concurrent {
        splitter.run_concurrent(&input).await?
    } else {
        splitter.run(&input)?
    };

    let writer = Writer::new(&args.out, OutputLayout::from_config(&config), engine, top)
        .force(args.force)
        .dry_run(args.dry_run);
    let report = writer.write(&outcome).await;

    if args.dry_run {
        for write in &report.written {
            println!("{}/", writer.root().join(&write.dir).display());
            for (name, _) in &write.files {
                println!("  {name}");
            }
        }
        println!();
    }
    print!("{}", report.render(writer.root()));

    if !report.is_clean() {
        return Err(format!("{} failure(s) during split", report.failures.len()).into());
    }
    Ok(())
}
