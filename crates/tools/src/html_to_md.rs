//! HTML-to-Markdown rendering of page snapshots.
//!
//! Conversion goes through `htmd` with ATX headings and inline links. If the
//! converter rejects the input, a plain-text rendering built with `scraper` is
//! returned instead, so a snapshot always carries some readable text.

use htmd::options::{CodeBlockStyle, HeadingStyle, LinkStyle, Options};
use htmd::HtmlToMarkdown;

/// Elements whose content never shows up as readable text.
const SKIPPED_TAGS: [&str; 6] = ["head", "script", "style", "noscript", "template", "svg"];

/// Convert a whole page to Markdown.
///
/// Unlike a reader-mode extraction, navigation, headers and footers are kept:
/// they usually hold the links an agent wants to act on.
pub fn html_to_markdown(html: &str) -> String {
    let options = Options {
        heading_style: HeadingStyle::Atx,
        code_block_style: CodeBlockStyle::Fenced,
        link_style: LinkStyle::Inlined,
        ..Default::default()
    };
    let converter = HtmlToMarkdown::builder()
        .skip_tags(SKIPPED_TAGS.to_vec())
        .options(options)
        .build();

    match converter.convert(html) {
        Ok(md) => clean_markdown(&md),
        Err(e) => {
            tracing::debug!(error = %e, "htmd conversion failed; using text fallback");
            extract_text_fallback(html)
        }
    }
}

/// Collapse runs of blank lines to one and trim the ends.
fn clean_markdown(md: &str) -> String {
    let mut result = String::with_capacity(md.len());
    let mut blank_run = false;

    for line in md.lines() {
        if line.trim().is_empty() {
            blank_run = true;
            continue;
        }
        if !result.is_empty() {
            result.push('\n');
            if blank_run {
                result.push('\n');
            }
        }
        blank_run = false;
        result.push_str(line.trim_end());
    }

    result
}

fn extract_text_fallback(html: &str) -> String {
    use scraper::{Html, Selector};

    let document = Html::parse_document(html);
    let root = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .unwrap_or_else(|| document.root_element());

    root.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
