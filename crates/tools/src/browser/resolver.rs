//! Priority-ordered target resolution.
//!
//! A caller-supplied target string is tried against six locator strategies in
//! a fixed order. The first strategy whose element is found and clicked wins;
//! timeouts and locate failures fall through to the next strategy.

use pagepilot_core::ResolverConfig;
use std::fmt;
use tracing::{debug, error, info, warn};

use super::locator::Locator;
use super::page::{Attempt, PageDriver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    CssSelector,
    ElementId,
    ExactText,
    PartialText,
    LinkHref,
    ButtonRole,
}

pub const STRATEGY_ORDER: [Strategy; 6] = [
    Strategy::CssSelector,
    Strategy::ElementId,
    Strategy::ExactText,
    Strategy::PartialText,
    Strategy::LinkHref,
    Strategy::ButtonRole,
];

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CssSelector => "css_selector",
            Self::ElementId => "element_id",
            Self::ExactText => "exact_text",
            Self::PartialText => "partial_text",
            Self::LinkHref => "link_href",
            Self::ButtonRole => "button_role",
        }
    }

    /// The locator this strategy would use for `target`, or `None` when the
    /// strategy does not apply.
    pub fn locator(&self, target: &str) -> Option<Locator> {
        match self {
            Self::CssSelector => {
                if target.starts_with('#') || target.starts_with('.') {
                    Some(Locator::Css(target.to_string()))
                } else {
                    None
                }
            }
            Self::ElementId => Some(Locator::Id(target.to_string())),
            Self::ExactText => Some(Locator::Text {
                text: target.to_string(),
                exact: true,
            }),
            Self::PartialText => Some(Locator::Text {
                text: target.to_string(),
                exact: false,
            }),
            Self::LinkHref => Some(Locator::Href(target.to_string())),
            Self::ButtonRole => Some(Locator::Role {
                role: "button".to_string(),
                name: target.to_string(),
            }),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOutcome {
    Resolved(Strategy),
    Exhausted,
}

/// Walk [`STRATEGY_ORDER`] until one strategy activates an element.
pub async fn resolve(page: &dyn PageDriver, target: &str, settings: &ResolverConfig) -> ResolutionOutcome {
    let timeout = settings.strategy_timeout();

    for strategy in STRATEGY_ORDER {
        let Some(locator) = strategy.locator(target) else {
            debug!(strategy = %strategy, target = %target, "Strategy not applicable");
            continue;
        };

        match page.activate(&locator, timeout).await {
            Attempt::Matched => {
                info!(strategy = %strategy, target = %target, "Action executed");
                return ResolutionOutcome::Resolved(strategy);
            }
            Attempt::TimedOut => {
                warn!(
                    strategy = %strategy,
                    target = %target,
                    timeout_ms = timeout.as_millis() as u64,
                    "Strategy timed out; trying next"
                );
            }
            Attempt::Failed(reason) => {
                warn!(strategy = %strategy, target = %target, reason = %reason, "Strategy failed; trying next");
            }
        }
    }

    error!(target = %target, "Could not resolve target with any strategy");
    ResolutionOutcome::Exhausted
}
