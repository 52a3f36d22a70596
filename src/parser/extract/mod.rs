pub mod contacts;
pub mod ctas;
pub mod headings;
pub mod meta;

use scraper::Html;

use crate::model::HomePage;
use crate::parser::{visible_text, word_count};

/// Page-level fields of the home page. `raw` is the unparsed markup, which
/// the email scan runs over directly.
pub fn home_page(doc: &Html, raw: &str, url: &str) -> HomePage {
    let text = visible_text(doc);

    HomePage {
        url: url.to_string(),
        title: meta::title(doc),
        h1: meta::h1(doc),
        meta_description: meta::description(doc),
        meta_keywords: meta::keywords(doc),
        emails: contacts::emails(raw),
        social_links: contacts::social_links(doc),
        ctas: ctas::extract(doc),
        word_count: word_count(&text),
        text,
    }
}

// ── Tests ──
