use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analyzer::Analyzer;
use crate::browser::{ChromeLauncher, Launcher};
use crate::cache::{CacheRead, CacheStore, CacheWrite};
use crate::config::Settings;
use crate::db::SqliteStore;
use crate::error::{Result, ScrapeError};
use crate::model::{HomeDossier, ScrapeResult};
use crate::normalize::normalize;
use crate::scraper::crawl_site;
use crate::techstack;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    CacheCheck,
    Crawl,
    Extract,
    Analyze,
    Persist,
    Done,
    Aborted,
}

/// A non-fatal failure. The run still reaches `Done`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Degraded {
    CacheRead(String),
    SubpageSkipped { url: String, reason: String },
    AnalysisEmpty,
    CacheWrite(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Source {
    Cache,
    Fresh,
}

#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub result: ScrapeResult,
    pub source: Source,
    pub stages: Vec<Stage>,
    pub degraded: Vec<Degraded>,
}

/// Answers one question about the caller: may it run a scrape?
pub trait AccessGate {
    fn is_allowed(&self) -> bool;
}

impl AccessGate for bool {
    fn is_allowed(&self) -> bool {
        *self
    }
}

/// Cache-first scrape pipeline. Built once, shared by every request.
pub struct Pipeline {
    launcher: Arc<dyn Launcher>,
    cache: CacheStore,
    analyzer: Analyzer,
    max_subpages: usize,
}

impl Pipeline {
    pub fn new(
        launcher: Arc<dyn Launcher>,
        cache: CacheStore,
        analyzer: Analyzer,
        max_subpages: usize,
    ) -> Self {
        Pipeline {
            launcher,
            cache,
            analyzer,
            max_subpages,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let cache = if settings.cache.enabled {
            let store = SqliteStore::open(&settings.db_path)
                .with_context(|| format!("Failed to open cache at {:?}", settings.db_path))?;
            CacheStore::new(Arc::new(store), settings.cache.ttl())
        } else {
            info!("Cache disabled by configuration");
            CacheStore::disabled()
        };
        let analyzer = Analyzer::from_settings(&settings.summarizer)?;
        let launcher = ChromeLauncher::new(settings.browser.clone());
        info!(
            "Pipeline ready (cache: {}, summarizer: {}, max sub-pages: {})",
            if settings.cache.enabled { "on" } else { "off" },
            if analyzer.is_enabled() { "on" } else { "off" },
            settings.crawl.max_subpages
        );

        Ok(Pipeline::new(
            Arc::new(launcher),
            cache,
            analyzer,
            settings.crawl.max_subpages,
        ))
    }

    pub async fn scrape(&self, url: &str) -> Result<ScrapeResult> {
        self.run(url).await.map(|outcome| outcome.result)
    }

    pub async fn scrape_as(&self, gate: &dyn AccessGate, url: &str) -> Result<ScrapeResult> {
        if !gate.is_allowed() {
            warn!("Rejected scrape of {}: caller not allowed", url);
            return Err(ScrapeError::Unauthorized);
        }
        self.scrape(url).await
    }

    /// CacheCheck → (hit) Done, or Crawl → Extract → Analyze → Persist → Done.
    /// Only crawl failures and invalid input end the run early.
    pub async fn run(&self, url: &str) -> Result<ScrapeOutcome> {
        let mut stages = vec![Stage::CacheCheck];
        let mut degraded = Vec::new();

        let target = normalize(url)?;
        let key = target.canonical.as_str();

        match self.cache.fetch(key, Utc::now()).await {
            CacheRead::Hit(result) => {
                stages.push(Stage::Done);
                return Ok(ScrapeOutcome {
                    result,
                    source: Source::Cache,
                    stages,
                    degraded,
                });
            }
            CacheRead::Miss => {}
            CacheRead::Unavailable(reason) => degraded.push(Degraded::CacheRead(reason)),
        }

        stages.push(Stage::Crawl);
        let crawl = match crawl_site(self.launcher.as_ref(), &target, self.max_subpages).await {
            Ok(crawl) => crawl,
            Err(e) => {
                stages.push(Stage::Aborted);
                warn!("Scrape of {} aborted ({:?}): {}", key, stages, e);
                return Err(e);
            }
        };
        for (link, err) in &crawl.subpages.skipped {
            degraded.push(Degraded::SubpageSkipped {
                url: link.clone(),
                reason: err.to_string(),
            });
        }

        stages.push(Stage::Extract);
        let technologies = techstack::detect(&crawl.home_html);
        if techstack::is_nothing_detected(&technologies) {
            debug!("No known technology fingerprints on {}", key);
        } else {
            info!("Detected on {}: {}", key, technologies.join(", "));
        }

        stages.push(Stage::Analyze);
        let combined = format!("{}{}", crawl.home.text, crawl.subpages.text);
        let ai_analysis = self.analyzer.analyze(&combined).await;
        if ai_analysis.is_empty() {
            degraded.push(Degraded::AnalysisEmpty);
        }

        let result = ScrapeResult {
            home: HomeDossier::compile(crawl.home, ai_analysis, technologies),
            subpages: crawl.subpages.dossiers,
        };

        stages.push(Stage::Persist);
        if let CacheWrite::Failed(reason) = self.cache.persist(key, result.clone(), Utc::now()).await {
            degraded.push(Degraded::CacheWrite(reason));
        }

        stages.push(Stage::Done);
        info!(
            "Scrape of {} done: {} sub-pages, {} degradations",
            key,
            result.subpages.len(),
            degraded.len()
        );
        Ok(ScrapeOutcome {
            result,
            source: Source::Fresh,
            stages,
            degraded,
        })
    }

    /// Flush the store. Call once before the process exits.
    pub fn shutdown(self) {
        self.cache.checkpoint();
        info!("Pipeline shut down");
    }
}

// ── Tests ──
