//! Lazy, single-browser session shared by describe and perform.

use async_trait::async_trait;
use pagepilot_core::{Config, Error, Paths, ResolverConfig, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::launcher::ChromeLauncher;
use super::page::PageDriver;

/// Starts a browser engine.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserHandle>>;
}

/// A running browser. Dropping it shuts the engine down.
#[async_trait]
pub trait BrowserHandle: Send + Sync {
    async fn new_page(&self) -> Result<Box<dyn PageDriver>>;
}

struct ActiveSession {
    // Field order matters: the page connection closes before the process is killed.
    page: Box<dyn PageDriver>,
    _browser: Box<dyn BrowserHandle>,
}

/// Owns at most one browser and one page for the lifetime of the process.
///
/// Nothing is launched until the first describe or perform call; every later
/// call reuses the same page.
pub struct BrowserSession {
    launcher: Arc<dyn BrowserLauncher>,
    settings: ResolverConfig,
    active: Option<ActiveSession>,
}

/// The session is shared by all tool invocations; the lock serializes them.
pub type SharedSession = Arc<Mutex<BrowserSession>>;

impl BrowserSession {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, settings: ResolverConfig) -> Self {
        Self {
            launcher,
            settings,
            active: None,
        }
    }

    pub fn from_config(config: &Config, paths: &Paths) -> Self {
        let launcher = ChromeLauncher::new(
            config.browser.clone(),
            paths,
            config.resolver.poll_interval(),
        );
        Self::new(Arc::new(launcher), config.resolver.clone())
    }

    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn is_initialized(&self) -> bool {
        self.active.is_some()
    }

    pub fn settings(&self) -> &ResolverConfig {
        &self.settings
    }

    /// Return the session page, launching the browser on first use.
    ///
    /// A failed launch leaves the session uninitialized so the next call retries.
    pub async fn ensure_page(&mut self) -> Result<&dyn PageDriver> {
        if self.active.is_none() {
            info!("Launching browser session");
            let browser = self.launcher.launch().await?;
            let page = browser.new_page().await?;
            self.active = Some(ActiveSession {
                page,
                _browser: browser,
            });
            info!("Browser session ready");
        } else {
            debug!("Browser already initialized; reusing existing page");
        }

        self.active
            .as_ref()
            .map(|s| s.page.as_ref())
            .ok_or_else(|| Error::Browser("browser session unavailable".into()))
    }

    /// Drop the page and browser, if any.
    pub fn close(&mut self) {
        if self.active.take().is_some() {
            info!("Browser session closed");
        }
    }
}
