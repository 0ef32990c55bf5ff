//! `kustsplit init` — starter configuration.

use kustsplit_config::SplitConfig;
use std::path::Path;

pub async fn run(output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let starter = SplitConfig::starter_yaml();
    let Some(path) = output else {
        print!("{starter}");
        return Ok(());
    };

    if path.exists() {
        return Err(format!(
            "{} already exists; edit it or remove it and run init again",
            path.display()
        )
        .into());
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, starter).await?;
    println!("Created {}", path.display());
    println!("\nNext steps:");
    println!("  1. Add rules to {}", path.display());
    println!("  2. Run: kustsplit explain {} --input <manifests>", path.display());
    println!("  3. Run: kustsplit split {} --input <manifests> --out <dir>", path.display());
    Ok(())
}
