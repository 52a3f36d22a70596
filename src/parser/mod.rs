pub mod extract;
pub mod links;

use scraper::{ElementRef, Html};

use crate::model::{HomePage, SubpageDossier};

/// Elements whose text never counts as visible page text.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Everything read from the home page in a single parse.
pub struct HomeScan {
    pub page: HomePage,
    pub links: Vec<String>,
}

/// Home markup → page fields + bounded list of sub-page links.
pub fn process_home(html: &str, url: &str, origin: &str, max_links: usize) -> HomeScan {
    let doc = Html::parse_document(html);
    let page = extract::home_page(&doc, html, url);
    let links = links::discover(&doc, origin, url, max_links);
    HomeScan { page, links }
}

/// Sub-page markup → dossier + its visible text.
pub fn process_subpage(html: &str, url: &str) -> (SubpageDossier, String) {
    let doc = Html::parse_document(html);
    let dossier = SubpageDossier {
        visited_url: url.to_string(),
        title: extract::meta::title(&doc),
        heading_map: extract::headings::heading_map(&doc),
    };
    (dossier, visible_text(&doc))
}

/// Text nodes outside scripts/styles, trimmed and joined by a single space.
pub fn visible_text(doc: &Html) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in doc.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| HIDDEN_TAGS.contains(&e.name()))
        });
        if hidden {
            continue;
        }
        let t = text.trim();
        if !t.is_empty() {
            parts.push(t);
        }
    }
    parts.join(" ")
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Inner text of an element with tags stripped and whitespace collapsed.
pub fn element_text(el: ElementRef) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Tests ──
