use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

const SOCIAL_DOMAINS: &[&str] = &[
    "linkedin.com",
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "wa.me",
    "whatsapp.com",
];

// Retina asset names like `logo@2x.png` match the email shape.
const ASSET_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];

/// Email-shaped substrings anywhere in the raw markup.
pub fn emails(raw: &str) -> BTreeSet<String> {
    EMAIL_RE
        .find_iter(raw)
        .map(|m| m.as_str())
        .filter(|m| {
            let lower = m.to_ascii_lowercase();
            !ASSET_SUFFIXES.iter().any(|ext| lower.ends_with(ext))
        })
        .map(str::to_string)
        .collect()
}

pub fn social_links(doc: &Html) -> BTreeSet<String> {
    doc.select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| is_social(href))
        .map(str::to_string)
        .collect()
}

fn is_social(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    SOCIAL_DOMAINS.iter().any(|d| lower.contains(d))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_dedup_and_skip_assets() {
        let raw = r#"<a href="mailto:hi@shop.com.br">hi@shop.com.br</a>
                     <img src="/img/logo@2x.png"> ops@shop.io"#;
        let found: Vec<String> = emails(raw).into_iter().collect();
        assert_eq!(found, vec!["hi@shop.com.br", "ops@shop.io"]);
    }

    #[test]
    fn social_allow_list_only() {
        let doc = Html::parse_document(
            r#"<a href="https://instagram.com/x">ig</a>
               <a href="https://github.com/x">gh</a>
               <a href="https://api.whatsapp.com/send?phone=1">wa</a>
               <a href="https://instagram.com/x">ig again</a>"#,
        );
        let found: Vec<String> = social_links(&doc).into_iter().collect();
        assert_eq!(
            found,
            vec!["https://api.whatsapp.com/send?phone=1", "https://instagram.com/x"]
        );
    }
}
