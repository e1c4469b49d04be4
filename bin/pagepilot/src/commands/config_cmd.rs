use pagepilot_core::{Config, Paths};
use std::path::Path;

use super::{config_file, load_config};

/// Show the effective configuration as pretty-printed JSON.
pub async fn show(config_path: Option<&Path>) -> anyhow::Result<()> {
    let paths = Paths::new();
    let file = config_file(&paths, config_path);
    let config = load_config(&paths, config_path)?;

    println!();
    println!("Current configuration");
    if file.exists() {
        println!("  File: {}", file.display());
    } else {
        println!("  File: {} (not found, showing defaults)", file.display());
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Write the default configuration.
pub async fn init(config_path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let paths = Paths::new();
    let file = config_file(&paths, config_path);

    if file.exists() && !force {
        println!("Config already exists at {}", file.display());
        println!("  Use --force to overwrite.");
        return Ok(());
    }

    if config_path.is_none() {
        paths.ensure_dirs()?;
    }
    Config::default().save(&file)?;
    println!("Wrote default config to {}", file.display());
    Ok(())
}
