//! The two page operations: describe and perform.

use pagepilot_core::{Error, Result};
use serde::Serialize;
use tracing::{info, warn};

use super::extract::{extract_actions, render_summary, ActionDescriptor};
use super::page::PageDriver;
use super::resolver::{resolve, ResolutionOutcome};
use super::session::BrowserSession;
use crate::html_to_md::html_to_markdown;

const ACTION_LIST_MARKER: &str = "\n\n<!-- ACTION LIST -->\n";

/// Reads of the page after a click; a navigation can tear down the document mid-read.
const SNAPSHOT_ATTEMPTS: usize = 3;

/// Snapshot of the current page.
#[derive(Debug, Clone, Serialize)]
pub struct PageDescription {
    pub url: String,
    /// Page markup followed by the rendered action summary.
    pub html: String,
    pub markdown: String,
    pub actions: Vec<ActionDescriptor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Success,
    Error,
}

/// Result of `perform_action`: a fresh page snapshot on success, a message on failure.
#[derive(Debug, Clone, Serialize)]
pub struct ActionReport {
    pub status: ActionStatus,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub page: Option<PageDescription>,
}

impl ActionReport {
    pub fn is_success(&self) -> bool {
        self.status == ActionStatus::Success
    }
}

/// Describe the current page, navigating to `url` first when one is given.
///
/// Launches the browser on first use. An empty `url` counts as absent.
pub async fn describe(session: &mut BrowserSession, url: Option<&str>) -> Result<PageDescription> {
    let nav_timeout = session.settings().navigation_timeout();
    let page = session.ensure_page().await?;

    if let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) {
        info!(url, "Navigating");
        page.goto(url, nav_timeout).await?;
        info!(url, "Page load complete");
    }

    snapshot(page).await
}

/// Resolve `target` to an element, click it, and describe the resulting page.
///
/// An unresolvable target is reported in the returned [`ActionReport`], not as
/// an `Err`. Only session failures (browser launch, page I/O) surface as errors.
pub async fn perform_action(session: &mut BrowserSession, target: &str) -> Result<ActionReport> {
    let settings = session.settings().clone();
    let page = session.ensure_page().await?;

    info!(target = %target, "Attempting action");
    if resolve(page, target, &settings).await == ResolutionOutcome::Exhausted {
        return Ok(ActionReport {
            status: ActionStatus::Error,
            target: target.to_string(),
            message: Some(format!("Could not execute action: {}", target)),
            page: None,
        });
    }

    match page.wait_for_network_idle(settings.settle_timeout()).await {
        Ok(true) => info!("Page settled after action"),
        Ok(false) => info!("No page navigation occurred after action"),
        Err(e) => info!(error = %e, "No page navigation occurred after action"),
    }

    let mut attempt = 1;
    let description = loop {
        match snapshot(page).await {
            Ok(description) => break description,
            Err(Error::Cdp(reason)) if attempt < SNAPSHOT_ATTEMPTS => {
                warn!(attempt, reason = %reason, "Page changed while reading it; retrying");
                attempt += 1;
                // A failed settle wait only means nothing more is loading.
                let _ = page.wait_for_network_idle(settings.settle_timeout()).await;
            }
            Err(e) => return Err(e),
        }
    };

    Ok(ActionReport {
        status: ActionStatus::Success,
        target: target.to_string(),
        message: None,
        page: Some(description),
    })
}

async fn snapshot(page: &dyn PageDriver) -> Result<PageDescription> {
    let html = page.content().await?;
    let markdown = html_to_markdown(&html);
    let actions = extract_actions(&html);
    info!(actions = actions.len(), "Page description ready");

    let mut annotated = html;
    annotated.push_str(ACTION_LIST_MARKER);
    annotated.push_str(&render_summary(&actions));

    Ok(PageDescription {
        url: page.url().await?,
        html: annotated,
        markdown,
        actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::extract::ActionKind;
    use crate::browser::locator::Locator;
    use crate::browser::testing::{FakeLauncher, FakePage};
    use pagepilot_core::ResolverConfig;
    use std::sync::Arc;

    const HOME: &str = r#"<!DOCTYPE html><html><head><title>Home</title></head><body>
<h1>Welcome</h1>
<button id="go">Go</button>
<a href="/next">Next</a>
</body></html>"#;

    const NEXT: &str = "<html><body><h1>Next page</h1><p>No actions here.</p></body></html>";

    fn session_with(page: &FakePage) -> (BrowserSession, FakeLauncher) {
        let launcher = FakeLauncher::new(page.clone());
        let settings = ResolverConfig {
            strategy_timeout_ms: 20,
            settle_timeout_ms: 20,
            ..ResolverConfig::default()
        };
        (BrowserSession::new(Arc::new(launcher.clone()), settings), launcher)
    }

    fn home_page() -> FakePage {
        FakePage::new("http://site.test/", HOME)
            .route("http://site.test/next", NEXT)
            .clickable(Locator::Id("go".into()))
            .navigates(Locator::Href("/next".into()), "http://site.test/next")
    }

    #[tokio::test]
    async fn test_describe_current_page() {
        let page = home_page();
        let (mut session, launcher) = session_with(&page);

        let desc = describe(&mut session, None).await.unwrap();
        assert_eq!(desc.url, "http://site.test/");
        assert_eq!(desc.actions.len(), 2);
        assert_eq!(desc.actions[0].kind, ActionKind::Button);
        assert_eq!(desc.actions[1].href.as_deref(), Some("/next"));
        assert!(desc.html.starts_with("<!DOCTYPE html>"));
        assert!(desc.html.contains("<!-- ACTION LIST -->\n<h2>Detected Actions</h2>"));
        assert!(desc.markdown.contains("# Welcome"));
        assert!(!desc.markdown.contains("ACTION LIST"));
        assert_eq!(launcher.launches(), 1);
    }

    #[tokio::test]
    async fn test_describe_navigates_to_url() {
        let page = home_page();
        let (mut session, _) = session_with(&page);

        let desc = describe(&mut session, Some("http://site.test/next")).await.unwrap();
        assert_eq!(desc.url, "http://site.test/next");
        assert!(desc.actions.is_empty());
        assert!(desc.html.ends_with("<h2>No actionable items detected.</h2>"));

        // blank url means "stay here"
        let again = describe(&mut session, Some("  ")).await.unwrap();
        assert_eq!(again.url, "http://site.test/next");
    }

    #[tokio::test]
    async fn test_describe_navigation_errors_surface() {
        let page = home_page();
        let (mut session, _) = session_with(&page);

        let err = describe(&mut session, Some("http://unknown.test/")).await.err().unwrap();
        assert!(matches!(err, Error::Browser(_)));
        let err = describe(&mut session, Some("slow://")).await.err().unwrap();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_describe_is_idempotent() {
        let page = home_page();
        let (mut session, launcher) = session_with(&page);

        let first = describe(&mut session, None).await.unwrap();
        let second = describe(&mut session, None).await.unwrap();
        assert_eq!(first.actions, second.actions);
        assert_eq!(first.html, second.html);
        assert_eq!(launcher.launches(), 1);
    }

    #[tokio::test]
    async fn test_perform_by_id() {
        let page = home_page();
        let (mut session, _) = session_with(&page);

        let report = perform_action(&mut session, "go").await.unwrap();
        assert!(report.is_success());
        assert_eq!(report.target, "go");
        assert_eq!(page.attempts(), vec![Locator::Id("go".into())]);
        assert_eq!(page.idle_waits(), 1);
        let desc = report.page.unwrap();
        assert_eq!(desc.url, "http://site.test/");
        assert_eq!(desc.actions.len(), 2);
    }

    #[tokio::test]
    async fn test_perform_by_href_navigates() {
        let page = home_page();
        let (mut session, _) = session_with(&page);

        let report = perform_action(&mut session, "/next").await.unwrap();
        assert!(report.is_success());
        assert_eq!(page.attempts().last(), Some(&Locator::Href("/next".into())));
        let desc = report.page.unwrap();
        assert_eq!(desc.url, "http://site.test/next");
        assert!(desc.markdown.contains("Next page"));
    }

    #[tokio::test]
    async fn test_perform_unresolvable_leaves_page() {
        let page = home_page();
        let (mut session, _) = session_with(&page);

        let before = describe(&mut session, None).await.unwrap();
        let report = perform_action(&mut session, "Nonexistent").await.unwrap();
        assert_eq!(report.status, ActionStatus::Error);
        assert_eq!(report.target, "Nonexistent");
        assert_eq!(report.message.as_deref(), Some("Could not execute action: Nonexistent"));
        assert!(report.page.is_none());
        assert_eq!(page.idle_waits(), 0);

        let after = describe(&mut session, None).await.unwrap();
        assert_eq!(before.actions, after.actions);
        assert_eq!(page.current_url(), "http://site.test/");
    }

    #[tokio::test]
    async fn test_perform_rereads_page_replaced_after_click() {
        let page = home_page().failing_content(SNAPSHOT_ATTEMPTS - 1);
        let (mut session, _) = session_with(&page);

        let report = perform_action(&mut session, "/next").await.unwrap();
        assert!(report.is_success());
        assert_eq!(report.page.unwrap().url, "http://site.test/next");
        assert_eq!(page.idle_waits(), SNAPSHOT_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_perform_gives_up_on_persistent_page_errors() {
        let page = home_page().failing_content(SNAPSHOT_ATTEMPTS);
        let (mut session, _) = session_with(&page);

        let err = perform_action(&mut session, "go").await.err().unwrap();
        assert!(matches!(err, Error::Cdp(_)));
        assert_eq!(page.idle_waits(), SNAPSHOT_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_perform_launch_failure_is_err() {
        let launcher = FakeLauncher::failing();
        let mut session = BrowserSession::new(Arc::new(launcher), ResolverConfig::default());
        let err = perform_action(&mut session, "go").await.err().unwrap();
        assert!(matches!(err, Error::Browser(_)));
    }

    #[tokio::test]
    async fn test_report_serialization() {
        let page = home_page();
        let (mut session, _) = session_with(&page);

        let ok = serde_json::to_value(perform_action(&mut session, "go").await.unwrap()).unwrap();
        assert_eq!(ok["status"], "success");
        assert_eq!(ok["target"], "go");
        assert_eq!(ok["url"], "http://site.test/");
        assert_eq!(ok["actions"][0]["type"], "button");
        assert!(ok.get("message").is_none());

        let err = serde_json::to_value(perform_action(&mut session, "nope").await.unwrap()).unwrap();
        assert_eq!(err["status"], "error");
        assert_eq!(err["target"], "nope");
        assert!(err.get("url").is_none());
    }

    const LIVE_PAGE: &str = "<!DOCTYPE html><html><head><title>Live</title></head><body>\
<button id=\"go\" onclick=\"this.dataset.clicked='1'\">Go</button>\
<a href=\"/next\" onclick=\"event.preventDefault();this.dataset.clicked='1'\">Next</a>\
<span>Save</span> <span>Save</span>\
<div role=\"button\" aria-label=\"Save\" style=\"width:80px;height:24px\" onclick=\"this.dataset.clicked='1'\"><img alt=\"\"></div>\
<button id=\"off\" disabled>Off</button>\
<a href=\"/article\" onclick=\"event.preventDefault()\">Read the full article</a>\
</body></html>";

    fn data_url(html: &str) -> String {
        format!("data:text/html,{}", html.replace('%', "%25").replace('#', "%23"))
    }

    /// Drives a real headless Chrome. Run with `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn test_resolution_chain_in_chrome() {
        use crate::browser::resolver::{resolve, Strategy};
        use pagepilot_core::{Config, Paths};

        let mut config = Config::default();
        config.resolver.strategy_timeout_ms = 300;
        config.resolver.settle_timeout_ms = 500;
        let paths = Paths::with_base(std::env::temp_dir().join(format!("pagepilot-live-{}", std::process::id())));
        let mut session = BrowserSession::from_config(&config, &paths);
        let settings = session.settings().clone();

        let before = describe(&mut session, Some(&data_url(LIVE_PAGE))).await.unwrap();
        assert_eq!(before.actions.len(), 5);

        let page = session.ensure_page().await.unwrap();
        assert_eq!(resolve(page, "go", &settings).await, ResolutionOutcome::Resolved(Strategy::ElementId));
        assert_eq!(resolve(page, "/next", &settings).await, ResolutionOutcome::Resolved(Strategy::LinkHref));
        // two "Save" spans make both text strategies ambiguous
        assert_eq!(resolve(page, "Save", &settings).await, ResolutionOutcome::Resolved(Strategy::ButtonRole));
        assert_eq!(
            resolve(page, "full ARTICLE", &settings).await,
            ResolutionOutcome::Resolved(Strategy::PartialText)
        );
        // disabled elements never count as clickable
        assert_eq!(resolve(page, "off", &settings).await, ResolutionOutcome::Exhausted);

        let html = page.content().await.unwrap();
        assert_eq!(html.matches("data-clicked=\"1\"").count(), 3);

        let clicked = describe(&mut session, None).await.unwrap();
        let report = perform_action(&mut session, "Nonexistent").await.unwrap();
        assert_eq!(report.status, ActionStatus::Error);
        let after = describe(&mut session, None).await.unwrap();
        assert_eq!(clicked.actions, after.actions);
        assert_eq!(clicked.url, after.url);

        session.close();
    }
}
