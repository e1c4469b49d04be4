//! Launching a local Chromium-family browser and opening its page target.

use async_trait::async_trait;
use pagepilot_core::{BrowserConfig, BrowserKind, Error, Paths, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tracing::{debug, info};

use super::cdp::CdpClient;
use super::page::{CdpPage, PageDriver};
use super::session::{BrowserHandle, BrowserLauncher};

/// Launches the browser named in [`BrowserConfig`].
pub struct ChromeLauncher {
    config: BrowserConfig,
    profile_dir: PathBuf,
    poll_interval: Duration,
}

impl ChromeLauncher {
    pub fn new(config: BrowserConfig, paths: &Paths, poll_interval: Duration) -> Self {
        let profile_dir = config
            .user_data_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| paths.browser_profile_dir());
        Self {
            config,
            profile_dir,
            poll_interval,
        }
    }

    fn resolve_binary(&self) -> Result<String> {
        if let Some(path) = &self.config.executable {
            return Ok(path.clone());
        }
        find_browser_binary(self.config.engine).ok_or_else(|| {
            Error::Browser(format!(
                "{} not found; install it or set browser.executable",
                self.config.engine.name()
            ))
        })
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserHandle>> {
        let binary = self.resolve_binary()?;
        std::fs::create_dir_all(&self.profile_dir).map_err(|e| {
            Error::Browser(format!(
                "failed to create profile dir {}: {}",
                self.profile_dir.display(),
                e
            ))
        })?;

        let debug_port = find_free_port().await?;
        let args = build_browser_args(&self.config, debug_port, &self.profile_dir);

        info!(
            browser = self.config.engine.name(),
            binary = %binary,
            port = debug_port,
            headless = self.config.headless,
            "Launching browser"
        );

        let child = Command::new(&binary)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Browser(format!("failed to launch {}: {}", binary, e)))?;

        let owns_profile = self.config.user_data_dir.is_none();
        let mut process = ChromeProcess {
            child,
            debug_port,
            profile_dir: self.profile_dir.clone(),
            owns_profile,
            viewport: (self.config.window_width, self.config.window_height),
            poll_interval: self.poll_interval,
        };

        let timeout = Duration::from_secs(self.config.launch_timeout_secs);
        if let Err(e) = wait_for_cdp_ready(debug_port, timeout).await {
            let _ = process.child.kill().await;
            return Err(e);
        }

        info!(port = debug_port, "Browser DevTools endpoint ready");
        Ok(Box::new(process))
    }
}

/// A running browser process with a remote-debugging port.
pub struct ChromeProcess {
    child: Child,
    debug_port: u16,
    profile_dir: PathBuf,
    owns_profile: bool,
    viewport: (u32, u32),
    poll_interval: Duration,
}

#[async_trait]
impl BrowserHandle for ChromeProcess {
    async fn new_page(&self) -> Result<Box<dyn PageDriver>> {
        let ws_url = get_page_ws_url(self.debug_port).await?;
        let cdp = CdpClient::connect(&ws_url).await?;
        let page = CdpPage::attach(cdp, self.poll_interval).await?;
        page.cdp().set_viewport(self.viewport.0, self.viewport.1).await?;
        info!(ws_url = %ws_url, "Attached to page target");
        Ok(Box::new(page))
    }
}

impl Drop for ChromeProcess {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
        if self.owns_profile {
            let _ = std::fs::remove_dir_all(&self.profile_dir);
        }
    }
}

pub fn build_browser_args(config: &BrowserConfig, debug_port: u16, user_data_dir: &Path) -> Vec<String> {
    let mut args = vec![
        format!("--remote-debugging-port={}", debug_port),
        format!("--user-data-dir={}", user_data_dir.display()),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-background-networking".to_string(),
        "--disable-extensions".to_string(),
        "--disable-sync".to_string(),
        "--disable-translate".to_string(),
        "--metrics-recording-only".to_string(),
        "--password-store=basic".to_string(),
    ];
    if config.headless {
        args.push("--headless=new".to_string());
    }
    args.push(format!("--window-size={},{}", config.window_width, config.window_height));
    args.push("about:blank".to_string());
    args
}

/// Find a browser binary on the system for the given engine.
pub fn find_browser_binary(engine: BrowserKind) -> Option<String> {
    let candidates: Vec<&str> = match engine {
        BrowserKind::Chrome => {
            if cfg!(target_os = "macos") {
                vec![
                    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                    "/Applications/Chromium.app/Contents/MacOS/Chromium",
                ]
            } else if cfg!(target_os = "linux") {
                vec![
                    "google-chrome",
                    "google-chrome-stable",
                    "chromium",
                    "chromium-browser",
                    "/usr/bin/google-chrome",
                    "/usr/bin/chromium",
                ]
            } else {
                vec![
                    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
                    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
                ]
            }
        }
        BrowserKind::Edge => {
            if cfg!(target_os = "macos") {
                vec!["/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge"]
            } else if cfg!(target_os = "linux") {
                vec!["microsoft-edge", "microsoft-edge-stable", "/usr/bin/microsoft-edge"]
            } else {
                vec![
                    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
                    r"C:\Program Files\Microsoft\Edge\Application\msedge.exe",
                ]
            }
        }
    };

    for candidate in candidates {
        if Path::new(candidate).exists() {
            return Some(candidate.to_string());
        }
        if !candidate.contains('/') && !candidate.contains('\\') && which::which(candidate).is_ok() {
            return Some(candidate.to_string());
        }
    }
    None
}

async fn find_free_port() -> Result<u16> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|e| Error::Browser(format!("failed to bind a free port: {}", e)))?;
    let port = listener
        .local_addr()
        .map_err(|e| Error::Browser(format!("failed to read local addr: {}", e)))?
        .port();
    drop(listener);
    Ok(port)
}

/// Poll `/json/version` until the DevTools endpoint answers.
async fn wait_for_cdp_ready(port: u16, timeout: Duration) -> Result<String> {
    let start = Instant::now();
    let url = format!("http://127.0.0.1:{}/json/version", port);

    loop {
        if start.elapsed() > timeout {
            return Err(Error::Browser(format!(
                "DevTools endpoint not ready after {}s on port {}",
                timeout.as_secs(),
                port
            )));
        }

        if let Ok(resp) = reqwest::get(&url).await {
            if let Ok(body) = resp.json::<Value>().await {
                if let Some(ws_url) = body.get("webSocketDebuggerUrl").and_then(|v| v.as_str()) {
                    return Ok(ws_url.to_string());
                }
            }
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

/// First `page` target listed by `/json/list`. Retries since the initial tab
/// may not be registered yet.
async fn get_page_ws_url(port: u16) -> Result<String> {
    let url = format!("http://127.0.0.1:{}/json/list", port);

    for attempt in 0..10 {
        if attempt > 0 {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }

        let targets: Vec<Value> = match reqwest::get(&url).await {
            Ok(resp) => match resp.json().await {
                Ok(t) => t,
                Err(_) => continue,
            },
            Err(_) => continue,
        };

        if let Some(ws_url) = first_page_ws_url(&targets) {
            return Ok(ws_url);
        }
        debug!(attempt, "No page target yet");
    }

    Err(Error::Browser("no page target found after retries".into()))
}

fn first_page_ws_url(targets: &[Value]) -> Option<String> {
    targets
        .iter()
        .filter(|t| t.get("type").and_then(|v| v.as_str()) == Some("page"))
        .find_map(|t| t.get("webSocketDebuggerUrl").and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}
