//! In-memory browser doubles for unit tests.

use async_trait::async_trait;
use pagepilot_core::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::locator::Locator;
use super::page::{Attempt, PageDriver};
use super::session::{BrowserHandle, BrowserLauncher};

#[derive(Default)]
struct FakeState {
    url: String,
    html: String,
    routes: HashMap<String, String>,
    /// Locators that resolve to a clickable element, with the URL the click navigates to.
    clickable: Vec<(Locator, Option<String>)>,
    ambiguous: Vec<Locator>,
    attempts: Vec<Locator>,
    navigated: bool,
    idle_waits: usize,
    /// Remaining `content()` calls that fail as if the document were being replaced.
    content_failures: usize,
}

/// A scripted page. Clones share state, so a test can keep a handle while the
/// session owns another.
#[derive(Clone, Default)]
pub struct FakePage {
    state: Arc<Mutex<FakeState>>,
}

impl FakePage {
    pub fn new(url: &str, html: &str) -> Self {
        let page = Self::default();
        {
            let mut s = page.state.lock().unwrap();
            s.url = url.to_string();
            s.html = html.to_string();
            s.routes.insert(url.to_string(), html.to_string());
        }
        page
    }

    pub fn route(self, url: &str, html: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .routes
            .insert(url.to_string(), html.to_string());
        self
    }

    /// Clicking `locator` succeeds and leaves the page where it is.
    pub fn clickable(self, locator: Locator) -> Self {
        self.state.lock().unwrap().clickable.push((locator, None));
        self
    }

    /// Clicking `locator` succeeds and loads `url` from the routes.
    pub fn navigates(self, locator: Locator, url: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .clickable
            .push((locator, Some(url.to_string())));
        self
    }

    pub fn ambiguous(self, locator: Locator) -> Self {
        self.state.lock().unwrap().ambiguous.push(locator);
        self
    }

    /// The next `n` reads of the page markup fail with a CDP error.
    pub fn failing_content(self, n: usize) -> Self {
        self.state.lock().unwrap().content_failures = n;
        self
    }

    pub fn attempts(&self) -> Vec<Locator> {
        self.state.lock().unwrap().attempts.clone()
    }

    pub fn idle_waits(&self) -> usize {
        self.state.lock().unwrap().idle_waits
    }

    pub fn current_url(&self) -> String {
        self.state.lock().unwrap().url.clone()
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        match s.routes.get(url).cloned() {
            Some(html) => {
                s.url = url.to_string();
                s.html = html;
                Ok(())
            }
            None if url == "slow://" => Err(Error::Timeout("navigation did not reach network idle".into())),
            None => Err(Error::Browser(format!("net::ERR_NAME_NOT_RESOLVED at {}", url))),
        }
    }

    async fn url(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn content(&self) -> Result<String> {
        let mut s = self.state.lock().unwrap();
        if s.content_failures > 0 {
            s.content_failures -= 1;
            return Err(Error::Cdp("Execution context was destroyed.".into()));
        }
        Ok(s.html.clone())
    }

    async fn activate(&self, locator: &Locator, _timeout: Duration) -> Attempt {
        let mut s = self.state.lock().unwrap();
        s.attempts.push(locator.clone());
        s.navigated = false;

        if s.ambiguous.contains(locator) {
            return Attempt::Failed(format!("2 elements match {}", locator));
        }
        let hit = s
            .clickable
            .iter()
            .find(|(l, _)| l == locator)
            .map(|(_, nav)| nav.clone());
        match hit {
            Some(Some(url)) => {
                let html = s.routes.get(&url).cloned().unwrap_or_default();
                s.url = url;
                s.html = html;
                s.navigated = true;
                Attempt::Matched
            }
            Some(None) => Attempt::Matched,
            None => Attempt::TimedOut,
        }
    }

    async fn wait_for_network_idle(&self, _timeout: Duration) -> Result<bool> {
        let mut s = self.state.lock().unwrap();
        s.idle_waits += 1;
        Ok(std::mem::take(&mut s.navigated))
    }
}

struct FakeBrowser {
    page: FakePage,
}

#[async_trait]
impl BrowserHandle for FakeBrowser {
    async fn new_page(&self) -> Result<Box<dyn PageDriver>> {
        Ok(Box::new(self.page.clone()))
    }
}

/// Counts launches; `failing()` simulates a missing browser binary.
#[derive(Clone)]
pub struct FakeLauncher {
    page: Option<FakePage>,
    launches: Arc<AtomicUsize>,
}

impl FakeLauncher {
    pub fn new(page: FakePage) -> Self {
        Self {
            page: Some(page),
            launches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            page: None,
            launches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserHandle>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        match &self.page {
            Some(page) => Ok(Box::new(FakeBrowser { page: page.clone() })),
            None => Err(Error::Browser("chrome not found".into())),
        }
    }
}
