//! Headless browser control for agents.
//!
//! - `session`: one lazily launched browser and page per process
//! - `extract`: buttons, links and role=button elements from page markup
//! - `resolver`: maps a free-form target string to a click via six ordered strategies
//! - `ops`: the `describe` and `perform_action` operations built on the above
//!
//! The browser is driven over the Chrome DevTools Protocol (`cdp`); `page`
//! abstracts the handful of page capabilities the operations need.

pub mod cdp;
pub mod extract;
pub mod launcher;
pub mod locator;
pub mod ops;
pub mod page;
pub mod resolver;
pub mod session;
pub mod tool;

#[cfg(test)]
pub(crate) mod testing;

pub use extract::{extract_actions, render_summary, ActionDescriptor, ActionKind};
pub use ops::{describe, perform_action, ActionReport, ActionStatus, PageDescription};
pub use session::{BrowserSession, SharedSession};
pub use tool::{PageDescriptionTool, PerformActionTool};
