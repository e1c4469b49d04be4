//! Actionable-element extraction from page markup.

use scraper::{ElementRef, Html, Selector};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt::Write;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Button,
    Link,
    RoleButton,
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Button => "Button",
            Self::Link => "Link",
            Self::RoleButton => "Role-Button",
        }
    }
}

/// One actionable element found in the markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDescriptor {
    pub kind: ActionKind,
    pub text: String,
    pub id: Option<String>,
    pub css_classes: Option<String>,
    pub href: Option<String>,
}

/// Links serialize as `{type, text, href}`; the other kinds as
/// `{type, text, id, class}`. Absent attributes are `null`, never omitted.
impl Serialize for ActionDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(if self.kind == ActionKind::Link { 3 } else { 4 }))?;
        map.serialize_entry("type", &self.kind)?;
        map.serialize_entry("text", &self.text)?;
        if self.kind == ActionKind::Link {
            map.serialize_entry("href", &self.href)?;
        } else {
            map.serialize_entry("id", &self.id)?;
            map.serialize_entry("class", &self.css_classes)?;
        }
        map.end()
    }
}

/// Scan order. A node matching several entries yields one descriptor per entry.
const SCANS: [(ActionKind, &str); 3] = [
    (ActionKind::Button, "button"),
    (ActionKind::Link, "a"),
    (ActionKind::RoleButton, "[role=\"button\"]"),
];

pub const EMPTY_SUMMARY: &str = "<h2>No actionable items detected.</h2>";

/// Collect buttons, then links, then `role="button"` elements, each group in
/// document order. Never fails: the parser recovers from malformed markup.
pub fn extract_actions(markup: &str) -> Vec<ActionDescriptor> {
    let document = Html::parse_document(markup);
    let mut actions = Vec::new();

    for (kind, css) in SCANS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        let before = actions.len();
        actions.extend(document.select(&selector).map(|el| describe_element(kind, el)));
        debug!(kind = kind.label(), count = actions.len() - before, "Extracted actions");
    }

    actions
}

fn describe_element(kind: ActionKind, el: ElementRef<'_>) -> ActionDescriptor {
    let attr = |name: &str| el.value().attr(name).map(|v| v.to_string());
    let (id, css_classes, href) = match kind {
        ActionKind::Link => (None, None, attr("href")),
        ActionKind::Button | ActionKind::RoleButton => (attr("id"), class_list(el), None),
    };
    ActionDescriptor {
        kind,
        text: visible_text(el),
        id,
        css_classes,
        href,
    }
}

fn visible_text(el: ElementRef<'_>) -> String {
    let raw: String = el.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classes in source order. `Element::classes()` comes back sorted, so read the attribute.
fn class_list(el: ElementRef<'_>) -> Option<String> {
    let joined = el
        .value()
        .attr("class")?
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// Render the descriptors as an HTML fragment, one `<li>` per descriptor.
pub fn render_summary(actions: &[ActionDescriptor]) -> String {
    if actions.is_empty() {
        return EMPTY_SUMMARY.to_string();
    }

    let mut out = String::from("<h2>Detected Actions</h2>\n<ul>\n");
    for action in actions {
        match action.kind {
            ActionKind::Link => {
                let _ = writeln!(
                    out,
                    "<li><b>{}:</b> {} (href: {})</li>",
                    action.kind.label(),
                    action.text,
                    action.href.as_deref().unwrap_or("")
                );
            }
            _ => {
                let _ = writeln!(
                    out,
                    "<li><b>{}:</b> {} (id: {}, class: {})</li>",
                    action.kind.label(),
                    action.text,
                    action.id.as_deref().unwrap_or("None"),
                    action.css_classes.as_deref().unwrap_or("None")
                );
            }
        }
    }
    out.push_str("</ul>");
    out
}
