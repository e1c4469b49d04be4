//! The page capability the extractor and resolver work against.

use async_trait::async_trait;
use pagepilot_core::{Error, Result};
use serde_json::Value;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use super::cdp::CdpClient;
use super::locator::{probe_script, Locator, Probe};

/// Outcome of one bounded locate-and-activate attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    /// Element found and clicked.
    Matched,
    /// Nothing clickable appeared before the deadline.
    TimedOut,
    /// The attempt could not proceed (bad selector, ambiguous match, protocol error).
    Failed(String),
}

#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate and wait for network idle, bounded by `timeout`.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;
    async fn url(&self) -> Result<String>;
    /// Serialized DOM of the main frame, doctype included.
    async fn content(&self) -> Result<String>;
    /// Wait up to `timeout` for the locator to yield a clickable element, then click it.
    async fn activate(&self, locator: &Locator, timeout: Duration) -> Attempt;
    /// `Ok(true)` if network idle was reached, `Ok(false)` if the wait expired.
    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<bool>;
}

const CONTENT_SCRIPT: &str = "(document.doctype ? new XMLSerializer().serializeToString(document.doctype) : '') + (document.documentElement ? document.documentElement.outerHTML : '')";

/// A page target driven over CDP.
pub struct CdpPage {
    cdp: CdpClient,
    lifecycle: Mutex<mpsc::Receiver<Value>>,
    main_frame: String,
    poll_interval: Duration,
}

/// Whether a `Page.lifecycleEvent` payload is `name` for the main frame,
/// optionally tied to one loader.
fn lifecycle_matches(event: &Value, name: &str, frame_id: &str, loader_id: Option<&str>) -> bool {
    let field = |key: &str| event.get(key).and_then(|v| v.as_str());
    field("name") == Some(name)
        && field("frameId") == Some(frame_id)
        && loader_id.map_or(true, |id| field("loaderId") == Some(id))
}

/// Run `check` every `poll_interval` until it reports a clickable element or
/// `timeout` passes. A single stalled evaluation counts against the same deadline.
async fn poll_until_found<F, Fut>(mut check: F, timeout: Duration, poll_interval: Duration) -> std::result::Result<(f64, f64), Attempt>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Probe>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match tokio::time::timeout(remaining, check()).await {
            Ok(Ok(Probe::Found { x, y })) => return Ok((x, y)),
            Ok(Ok(Probe::Ambiguous(count))) => return Err(Attempt::Failed(format!("{} elements match", count))),
            Ok(Ok(Probe::Invalid(reason))) => return Err(Attempt::Failed(reason)),
            Ok(Ok(Probe::Pending)) => {}
            Ok(Err(e)) => return Err(Attempt::Failed(e.to_string())),
            Err(_) => return Err(Attempt::TimedOut),
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(Attempt::TimedOut);
        }
        tokio::time::sleep(poll_interval.min(remaining)).await;
    }
}

impl CdpPage {
    /// Wrap a connected client: enables the domains we rely on and starts
    /// listening for lifecycle events.
    pub async fn attach(cdp: CdpClient, poll_interval: Duration) -> Result<Self> {
        cdp.enable_domain("Page").await?;
        cdp.enable_domain("Runtime").await?;
        cdp.enable_domain("DOM").await?;
        cdp.enable_domain("Network").await?;
        cdp.enable_lifecycle_events().await?;
        let lifecycle = cdp.subscribe_event("Page.lifecycleEvent").await;

        let tree = cdp.send_command("Page.getFrameTree", serde_json::json!({})).await?;
        let main_frame = tree
            .pointer("/frameTree/frame/id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Cdp("Page.getFrameTree returned no main frame".into()))?
            .to_string();
        debug!(frame_id = %main_frame, "Attached to page");

        Ok(Self {
            cdp,
            lifecycle: Mutex::new(lifecycle),
            main_frame,
            poll_interval,
        })
    }

    pub fn cdp(&self) -> &CdpClient {
        &self.cdp
    }

    /// Forget lifecycle events that belong to earlier loads.
    async fn drain_lifecycle(&self) {
        let mut rx = self.lifecycle.lock().await;
        while rx.try_recv().is_ok() {}
    }

    async fn wait_lifecycle(&self, name: &str, loader_id: Option<&str>, timeout: Duration) -> Result<bool> {
        let mut rx = self.lifecycle.lock().await;
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            match tokio::time::timeout(remaining, rx.recv()).await {
                Ok(Some(event)) => {
                    if lifecycle_matches(&event, name, &self.main_frame, loader_id) {
                        return Ok(true);
                    }
                }
                Ok(None) => return Err(Error::Cdp("lifecycle event stream closed".into())),
                Err(_) => return Ok(false),
            }
        }
    }

    async fn probe(&self, script: &str) -> Result<Probe> {
        let value = self.cdp.evaluate_value(script).await?;
        Ok(Probe::from_value(&value))
    }
}

#[async_trait]
impl PageDriver for CdpPage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        self.drain_lifecycle().await;
        let nav = self.cdp.navigate(url).await?;

        if let Some(err) = nav.get("errorText").and_then(|v| v.as_str()) {
            if !err.is_empty() {
                return Err(Error::Browser(format!("navigation to {} failed: {}", url, err)));
            }
        }

        // Same-document navigations (fragment changes) carry no loader.
        let Some(loader_id) = nav.get("loaderId").and_then(|v| v.as_str()) else {
            debug!(url, "Same-document navigation; nothing to wait for");
            return Ok(());
        };

        if self.wait_lifecycle("networkIdle", Some(loader_id), timeout).await? {
            Ok(())
        } else {
            Err(Error::Timeout(format!(
                "navigation to {} did not reach network idle within {}ms",
                url,
                timeout.as_millis()
            )))
        }
    }

    async fn url(&self) -> Result<String> {
        self.cdp.evaluate_string("window.location.href").await
    }

    async fn content(&self) -> Result<String> {
        self.cdp.evaluate_string(CONTENT_SCRIPT).await
    }

    async fn activate(&self, locator: &Locator, timeout: Duration) -> Attempt {
        self.drain_lifecycle().await;
        let script = probe_script(locator);
        let script = script.as_str();

        let (x, y) = match poll_until_found(move || self.probe(script), timeout, self.poll_interval).await {
            Ok(point) => point,
            Err(Attempt::Failed(reason)) => return Attempt::Failed(format!("{} ({})", reason, locator)),
            Err(other) => return other,
        };

        match self.cdp.click_at(x, y).await {
            Ok(()) => {
                info!(%locator, x, y, "Clicked element");
                Attempt::Matched
            }
            Err(e) => Attempt::Failed(format!("click failed: {}", e)),
        }
    }

    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<bool> {
        self.wait_lifecycle("networkIdle", None, timeout).await
    }
}
