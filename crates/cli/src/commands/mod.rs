pub mod check;
pub mod explain;
pub mod init;
pub mod split;

use kustsplit_config::SplitConfig;
use std::path::Path;

/// Load a configuration, applying environment overrides.
pub fn load_config(path: &Path) -> Result<SplitConfig, Box<dyn std::error::Error>> {
    let config =
        SplitConfig::load(path).map_err(|e| format!("Failed to load config: {e}"))?;
    Ok(config)
}
