use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Runtime settings, read from an optional `dossier.toml` and `DOSSIER_*`
/// environment variables (`__` separates nested keys).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub db_path: PathBuf,
    pub cache: CacheSettings,
    pub browser: BrowserSettings,
    pub crawl: CrawlSettings,
    pub summarizer: SummarizerSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub chrome_path: Option<PathBuf>,
    pub page_load_timeout_secs: u64,
    pub dom_wait_timeout_secs: u64,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    pub max_subpages: usize,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SummarizerSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_input_chars: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            db_path: PathBuf::from("data/dossier.sqlite"),
            cache: CacheSettings::default(),
            browser: BrowserSettings::default(),
            crawl: CrawlSettings::default(),
            summarizer: SummarizerSettings::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            enabled: true,
            ttl_hours: 24,
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        BrowserSettings {
            chrome_path: None,
            page_load_timeout_secs: 20,
            dom_wait_timeout_secs: 10,
            window_width: 1920,
            window_height: 1080,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        CrawlSettings { max_subpages: 5 }
    }
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        SummarizerSettings {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-pro-latest".to_string(),
            temperature: 0.3,
            timeout_secs: 60,
            max_input_chars: 30_000,
        }
    }
}

// Keeps the key out of `?settings` log lines.
impl std::fmt::Debug for SummarizerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummarizerSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_input_chars", &self.max_input_chars)
            .finish()
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let mut settings: Settings = config::Config::builder()
            .add_source(config::File::with_name("dossier").required(false))
            .add_source(
                config::Environment::with_prefix("DOSSIER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")?;

        if settings.summarizer.api_key.is_none() {
            settings.summarizer.api_key = std::env::var("GOOGLE_API_KEY").ok();
        }
        settings.summarizer.api_key = settings
            .summarizer
            .api_key
            .take()
            .filter(|k| !k.trim().is_empty());
        Ok(settings)
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.ttl_hours)
    }
}

impl BrowserSettings {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn dom_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.dom_wait_timeout_secs)
    }
}

// ── Tests ──
