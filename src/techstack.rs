use std::sync::LazyLock;

use regex::Regex;

/// Returned alone when no fingerprint matches. Means "unknown", not a technology.
pub const NOTHING_DETECTED: &str = "No specific technology detected";

const FINGERPRINTS: &[(&str, &str)] = &[
    ("React", r"react-dom|react\.js|react\.min\.js"),
    ("Vue.js", r"vue\.js|vue\.min\.js"),
    ("Angular", r"angular\.js|angular\.min\.js"),
    ("jQuery", r"jquery\.js|jquery\.min\.js"),
    ("WordPress", r"wp-content|wp-includes"),
    ("Shopify", r"cdn\.shopify\.com"),
    ("VTEX", r"vteximg\.com\.br|vtexassets\.com"),
    ("Nuvemshop", r"cdn\.nuvemshop\.com\.br"),
    ("Wix", r"wix\.com|static\.parastorage\.com"),
    (
        "Google Analytics",
        r"google-analytics\.com/analytics\.js|gtag\('config', 'UA-",
    ),
    ("Google Tag Manager", r"googletagmanager\.com/gtm\.js"),
    ("Hotjar", r"static\.hotjar\.com"),
    ("RD Station", r"tools\.rdstation\.com\.br"),
];

static COMPILED: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    FINGERPRINTS
        .iter()
        .map(|(name, pattern)| (*name, Regex::new(&format!("(?i){}", pattern)).unwrap()))
        .collect()
});

/// Technologies whose fingerprint appears in the raw markup, in table order.
pub fn detect(html: &str) -> Vec<String> {
    let found: Vec<String> = COMPILED
        .iter()
        .filter(|(_, re)| re.is_match(html))
        .map(|(name, _)| name.to_string())
        .collect();

    if found.is_empty() {
        vec![NOTHING_DETECTED.to_string()]
    } else {
        found
    }
}

pub fn is_nothing_detected(stack: &[String]) -> bool {
    matches!(stack, [only] if only == NOTHING_DETECTED)
}

// ── Tests ──
