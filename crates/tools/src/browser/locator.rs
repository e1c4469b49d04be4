//! Element locators and the in-page script that resolves them.

use std::fmt;

/// How a single strategy addresses an element on the live page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Raw CSS selector, first match wins.
    Css(String),
    /// Element id, equivalent to `#<id>` with the id escaped.
    Id(String),
    /// `<a>` whose `href` attribute equals the value.
    Href(String),
    /// Smallest element whose normalized text matches. Must be unique.
    Text { text: String, exact: bool },
    /// Element with the given ARIA role whose accessible name equals `name`. Must be unique.
    Role { role: String, name: String },
}

impl Locator {
    /// Locators that refuse to act when more than one element matches.
    pub fn is_strict(&self) -> bool {
        matches!(self, Locator::Text { .. } | Locator::Role { .. })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(sel) => write!(f, "css={}", sel),
            Locator::Id(id) => write!(f, "#{}", id),
            Locator::Href(href) => write!(f, "a[href='{}']", href),
            Locator::Text { text, exact: true } => write!(f, "text=\"{}\"", text),
            Locator::Text { text, exact: false } => write!(f, "text~\"{}\"", text),
            Locator::Role { role, name } => write!(f, "role={}[name=\"{}\"]", role, name),
        }
    }
}

/// Result of a single in-page probe.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe {
    /// Unique (or first, for non-strict locators) visible element, center in viewport coordinates.
    Found { x: f64, y: f64 },
    /// Nothing clickable yet: no match, hidden, or disabled.
    Pending,
    /// Strict locator matched several elements.
    Ambiguous(u64),
    /// The locator cannot be evaluated (bad selector syntax).
    Invalid(String),
}

impl Probe {
    pub fn from_value(value: &serde_json::Value) -> Self {
        match value.get("status").and_then(|v| v.as_str()) {
            Some("found") => Probe::Found {
                x: value.get("x").and_then(|v| v.as_f64()).unwrap_or(0.0),
                y: value.get("y").and_then(|v| v.as_f64()).unwrap_or(0.0),
            },
            Some("ambiguous") => Probe::Ambiguous(value.get("count").and_then(|v| v.as_u64()).unwrap_or(0)),
            Some("invalid") => Probe::Invalid(
                value
                    .get("reason")
                    .and_then(|v| v.as_str())
                    .unwrap_or("invalid locator")
                    .to_string(),
            ),
            _ => Probe::Pending,
        }
    }
}

fn js_string(s: &str) -> String {
    // JSON string literals are valid JS string literals.
    serde_json::Value::String(s.to_string()).to_string()
}

/// Build the candidate-list expression for a locator.
fn finder_expression(locator: &Locator) -> String {
    match locator {
        Locator::Css(sel) => format!("Array.from(document.querySelectorAll({}))", js_string(sel)),
        Locator::Id(id) => format!(
            "Array.from(document.querySelectorAll('#' + CSS.escape({})))",
            js_string(id)
        ),
        Locator::Href(href) => format!(
            "Array.from(document.querySelectorAll('a[href=\"' + CSS.escape({}) + '\"]'))",
            js_string(href)
        ),
        Locator::Text { text, exact } => format!("__byText({}, {})", js_string(text), exact),
        Locator::Role { role, name } => format!("__byRole({}, {})", js_string(role), js_string(name)),
    }
}

const HELPERS: &str = r#"
const __norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
const __SKIP = new Set(['SCRIPT', 'STYLE', 'NOSCRIPT', 'TEMPLATE', 'HEAD', 'TITLE']);
const __ownText = (el) => {
  if (el.tagName === 'INPUT' && ['button', 'submit', 'reset'].includes((el.type || '').toLowerCase())) {
    return __norm(el.value);
  }
  return __norm(el.textContent);
};
const __byText = (needle, exact) => {
  const want = __norm(needle);
  const lower = want.toLowerCase();
  const test = (t) => exact ? t === want : t.toLowerCase().includes(lower);
  const root = document.body || document.documentElement;
  if (!root) return [];
  const hits = new Set();
  for (const el of root.querySelectorAll('*')) {
    if (__SKIP.has(el.tagName)) continue;
    if (test(__ownText(el))) hits.add(el);
  }
  return Array.from(hits).filter((el) => !Array.from(el.children).some((c) => hits.has(c)));
};
const __implicitRole = (el) => {
  const tag = el.tagName;
  if (tag === 'BUTTON' || tag === 'SUMMARY') return 'button';
  if (tag === 'INPUT') {
    const t = (el.type || '').toLowerCase();
    if (['button', 'submit', 'reset', 'image'].includes(t)) return 'button';
  }
  if (tag === 'A' && el.hasAttribute('href')) return 'link';
  return null;
};
const __accName = (el) => {
  const labelledBy = el.getAttribute('aria-labelledby');
  if (labelledBy) {
    const parts = labelledBy.split(/\s+/).map((id) => document.getElementById(id)).filter(Boolean);
    if (parts.length) return __norm(parts.map((p) => p.textContent).join(' '));
  }
  const label = el.getAttribute('aria-label');
  if (label && __norm(label)) return __norm(label);
  if (el.tagName === 'INPUT') {
    const t = (el.type || '').toLowerCase();
    if (t === 'image') return __norm(el.getAttribute('alt') || el.value || 'Submit');
    if (el.value) return __norm(el.value);
    if (t === 'submit') return 'Submit';
    if (t === 'reset') return 'Reset';
  }
  const text = __norm(el.textContent);
  if (text) return text;
  return __norm(el.getAttribute('title'));
};
const __rendered = (el) => {
  if (el.closest('[aria-hidden="true"]')) return false;
  const style = getComputedStyle(el);
  return style.display !== 'none' && style.visibility !== 'hidden' && el.getClientRects().length > 0;
};
const __byRole = (role, name) => {
  const want = __norm(name);
  return Array.from(document.querySelectorAll('*')).filter((el) => {
    const explicit = el.getAttribute('role');
    const r = explicit ? explicit.trim().split(/\s+/)[0].toLowerCase() : __implicitRole(el);
    return r === role && __rendered(el) && __accName(el) === want;
  });
};
"#;

/// Produce a self-contained expression that probes for the locator's element.
///
/// The expression evaluates to `{status: found|pending|ambiguous|invalid, ...}`
/// and scrolls the element into view before reporting its center.
pub fn probe_script(locator: &Locator) -> String {
    format!(
        r#"(() => {{
{helpers}
  let matches;
  try {{
    matches = {finder};
  }} catch (e) {{
    return {{ status: 'invalid', reason: String((e && e.message) || e) }};
  }}
  if (matches.length === 0) return {{ status: 'pending', reason: 'no match' }};
  if ({strict} && matches.length > 1) return {{ status: 'ambiguous', count: matches.length }};
  const el = matches[0];
  if (el.disabled) return {{ status: 'pending', reason: 'disabled' }};
  el.scrollIntoView({{ block: 'center', inline: 'center' }});
  const style = getComputedStyle(el);
  const r = el.getBoundingClientRect();
  if (style.visibility === 'hidden' || style.display === 'none' || r.width === 0 || r.height === 0) {{
    return {{ status: 'pending', reason: 'not visible' }};
  }}
  return {{ status: 'found', x: r.left + r.width / 2, y: r.top + r.height / 2 }};
}})()"#,
        helpers = HELPERS,
        finder = finder_expression(locator),
        strict = locator.is_strict(),
    )
}
