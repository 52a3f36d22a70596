use std::collections::BTreeSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::parser::element_text;

static CLICKABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a, button").unwrap());

const CTA_PHRASES: &[&str] = &[
    "contact",
    "quote",
    "learn more",
    "schedule",
    "demo",
    "free trial",
    "contato",
    "fale conosco",
    "orçamento",
    "saiba mais",
    "agende",
    "demonstração",
    "teste grátis",
];

/// Display text of links and buttons that read like a call to action.
pub fn extract(doc: &Html) -> BTreeSet<String> {
    doc.select(&CLICKABLE)
        .map(element_text)
        .filter(|text| is_cta(text))
        .collect()
}

pub fn is_cta(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    CTA_PHRASES.iter().any(|p| lower.contains(p))
}

// ── Tests ──
