pub mod config_cmd;
pub mod page;
pub mod tools_cmd;

use pagepilot_core::{Config, Paths};
use pagepilot_tools::BrowserSession;
use std::path::{Path, PathBuf};

/// Config file to use: the `--config` override, else the default location.
pub fn config_file(paths: &Paths, override_path: Option<&Path>) -> PathBuf {
    override_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths.config_file())
}

pub fn load_config(paths: &Paths, override_path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match override_path {
        Some(path) => Config::load(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path.display(), e))?,
        None => Config::load_or_default(paths)?,
    };
    Ok(config)
}

/// A fresh, not yet launched, browser session built from the config.
pub fn open_session(override_path: Option<&Path>) -> anyhow::Result<BrowserSession> {
    let paths = Paths::new();
    let config = load_config(&paths, override_path)?;
    Ok(BrowserSession::from_config(&config, &paths))
}
