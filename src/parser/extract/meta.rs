use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::parser::{collapse_whitespace, element_text};

static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static KEYWORDS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="keywords"]"#).unwrap());

pub fn title(doc: &Html) -> String {
    doc.select(&TITLE).next().map(element_text).unwrap_or_default()
}

pub fn h1(doc: &Html) -> String {
    doc.select(&H1).next().map(element_text).unwrap_or_default()
}

pub fn description(doc: &Html) -> String {
    content_of(doc, &DESCRIPTION)
        .map(|c| collapse_whitespace(&c))
        .unwrap_or_default()
}

/// Comma-separated keywords, trimmed, empties dropped.
pub fn keywords(doc: &Html) -> Vec<String> {
    content_of(doc, &KEYWORDS)
        .map(|raw| {
            raw.split(',')
                .map(|k| k.trim())
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn content_of(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::to_string)
}

// ── Tests ──
