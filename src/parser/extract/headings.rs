use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::parser::element_text;

static HEADINGS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2, h3").unwrap());

/// `"H2: text"` / `"H3: text"` entries in document order.
pub fn heading_map(doc: &Html) -> Vec<String> {
    doc.select(&HEADINGS)
        .map(|h| format!("{}: {}", h.value().name().to_ascii_uppercase(), element_text(h)))
        .collect()
}

// ── Tests ──
