use url::Url;

use crate::error::{Result, ScrapeError};

/// Cache key plus the origin used to resolve relative links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalUrl {
    pub canonical: String,
    pub origin: String,
}

/// `scheme://host[:port]/path` with trailing slashes, query and fragment removed.
pub fn normalize(raw: &str) -> Result<CanonicalUrl> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ScrapeError::InvalidUrl("URL is required".into()));
    }

    let parsed = Url::parse(raw).map_err(|e| ScrapeError::InvalidUrl(format!("{}: {}", raw, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ScrapeError::InvalidUrl(format!(
            "{}: unsupported scheme '{}'",
            raw,
            parsed.scheme()
        )));
    }
    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ScrapeError::InvalidUrl(format!("{}: missing host", raw)))?;

    let origin = match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    };
    let canonical = format!("{}{}", origin, parsed.path())
        .trim_end_matches('/')
        .to_string();

    Ok(CanonicalUrl { canonical, origin })
}

// ── Tests ──
