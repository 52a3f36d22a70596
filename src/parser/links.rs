use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Paths that look like about/services/contact/company pages.
static CONTENT_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(sobre|quem-somos|servicos|produtos|contato|empresa|institucional|solucoes|about|services|products|contact|company|solutions)",
    )
    .unwrap()
});

/// Same-origin content links in document order of first encounter, capped at `limit`.
pub fn discover(doc: &Html, origin: &str, home_url: &str, limit: usize) -> Vec<String> {
    let Ok(base) = Url::parse(origin) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for href in doc.select(&ANCHOR).filter_map(|a| a.value().attr("href")) {
        if links.len() >= limit {
            break;
        }
        let Some(resolved) = resolve_same_origin(&base, href) else {
            continue;
        };
        if !CONTENT_LINK_RE.is_match(&path_and_query(&resolved)) {
            continue;
        }
        let resolved = resolved.to_string();
        // `/about` and `/about/` are one page.
        let key = resolved.trim_end_matches('/').to_string();
        if key == home_url || !seen.insert(key) {
            continue;
        }
        links.push(resolved);
    }

    links
}

/// Everything after the host; query-routed pages (`?page=sobre`) qualify too.
fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(q) => format!("{}?{}", url.path(), q),
        None => url.path().to_string(),
    }
}

/// Absolute URL for `href` if it stays on `base`'s origin; fragment dropped.
fn resolve_same_origin(base: &Url, href: &str) -> Option<Url> {
    let mut url = base.join(href.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.origin() != base.origin() {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

// ── Tests ──
