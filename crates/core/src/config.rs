use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::paths::Paths;

/// Chromium-family browsers that expose the DevTools protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Chrome,
    Edge,
}

impl BrowserKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Edge => "edge",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserConfig {
    #[serde(default)]
    pub engine: BrowserKind,
    /// Explicit path to the browser binary. Skips discovery when set.
    #[serde(default)]
    pub executable: Option<String>,
    #[serde(default = "default_headless")]
    pub headless: bool,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    #[serde(default = "default_launch_timeout_secs")]
    pub launch_timeout_secs: u64,
    #[serde(default)]
    pub user_data_dir: Option<String>,
}

fn default_headless() -> bool {
    true
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    720
}

fn default_launch_timeout_secs() -> u64 {
    15
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            engine: BrowserKind::default(),
            executable: None,
            headless: default_headless(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            launch_timeout_secs: default_launch_timeout_secs(),
            user_data_dir: None,
        }
    }
}

/// Time bounds for every suspension point of describe/perform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Per-strategy wait for the target element to become clickable.
    #[serde(default = "default_strategy_timeout_ms")]
    pub strategy_timeout_ms: u64,
    /// Wait for network idle after a successful click.
    #[serde(default = "default_settle_timeout_ms")]
    pub settle_timeout_ms: u64,
    /// Wait for network idle after navigating to an explicit URL.
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_strategy_timeout_ms() -> u64 {
    30_000
}

fn default_settle_timeout_ms() -> u64 {
    3_000
}

fn default_navigation_timeout_ms() -> u64 {
    30_000
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl ResolverConfig {
    pub fn strategy_timeout(&self) -> Duration {
        Duration::from_millis(self.strategy_timeout_ms)
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            strategy_timeout_ms: default_strategy_timeout_ms(),
            settle_timeout_ms: default_settle_timeout_ms(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(paths: &Paths) -> Result<Self> {
        let config_path = paths.config_file();
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.resolver.strategy_timeout_ms == 0 {
            return Err(Error::Config("resolver.strategyTimeoutMs must be > 0".into()));
        }
        if self.resolver.navigation_timeout_ms == 0 {
            return Err(Error::Config("resolver.navigationTimeoutMs must be > 0".into()));
        }
        if self.browser.window_width == 0 || self.browser.window_height == 0 {
            return Err(Error::Config("browser window size must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert!(cfg.browser.headless);
        assert_eq!(cfg.browser.engine, BrowserKind::Chrome);
        assert_eq!(cfg.resolver.strategy_timeout_ms, 30_000);
        assert_eq!(cfg.resolver.settle_timeout_ms, 3_000);
        assert_eq!(cfg.resolver.navigation_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_camel_case_fields() {
        let raw = r#"{
  "browser": { "engine": "edge", "headless": false, "windowWidth": 800 },
  "resolver": { "strategyTimeoutMs": 500, "pollIntervalMs": 1 }
}"#;
        let cfg: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.browser.engine, BrowserKind::Edge);
        assert!(!cfg.browser.headless);
        assert_eq!(cfg.browser.window_width, 800);
        assert_eq!(cfg.browser.window_height, 720);
        assert_eq!(cfg.resolver.strategy_timeout(), Duration::from_millis(500));
        // clamped so polling never spins
        assert_eq!(cfg.resolver.poll_interval(), Duration::from_millis(10));
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join("test_pagepilot_config_roundtrip");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("config.json");

        let mut cfg = Config::default();
        cfg.resolver.settle_timeout_ms = 1234;
        cfg.browser.executable = Some("/usr/bin/chromium".to_string());
        cfg.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.resolver.settle_timeout_ms, 1234);
        assert_eq!(loaded.browser.executable.as_deref(), Some("/usr/bin/chromium"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let paths = Paths::with_base(std::env::temp_dir().join("test_pagepilot_no_config"));
        let cfg = Config::load_or_default(&paths).unwrap();
        assert_eq!(cfg.resolver.poll_interval_ms, 100);
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut cfg = Config::default();
        cfg.resolver.strategy_timeout_ms = 0;
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_browser_kind_names() {
        let kind: BrowserKind = serde_json::from_str("\"edge\"").unwrap();
        assert_eq!(kind, BrowserKind::Edge);
        assert_eq!(kind.name(), "edge");
        assert!(serde_json::from_str::<BrowserKind>("\"firefox\"").is_err());
    }
}
