//! In-process stand-ins for the browser, the record store and the summarizer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::analyzer::Summarizer;
use crate::browser::{Launcher, Session};
use crate::db::{CachedRecord, RecordStore};
use crate::error::{AnalyzeError, Result, ScrapeError, StoreError};
use crate::model::AiAnalysis;

// ── Browser ──

#[derive(Clone)]
pub enum FakePage {
    Html(String),
    NavigationTimeout,
    WaitTimeout,
}

#[derive(Default)]
struct Counters {
    launches: AtomicUsize,
    navigations: AtomicUsize,
    releases: AtomicUsize,
}

/// Serves canned pages by URL and counts what the pipeline did with them.
pub struct FakeLauncher {
    pages: Arc<Mutex<HashMap<String, FakePage>>>,
    counters: Arc<Counters>,
    available: bool,
}

impl FakeLauncher {
    pub fn new() -> Self {
        FakeLauncher {
            pages: Arc::new(Mutex::new(HashMap::new())),
            counters: Arc::new(Counters::default()),
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        FakeLauncher {
            available: false,
            ..FakeLauncher::new()
        }
    }

    pub fn page(self, url: &str, page: FakePage) -> Self {
        self.add(url, page);
        self
    }

    pub fn add(&self, url: &str, page: FakePage) {
        self.pages.lock().unwrap().insert(url.to_string(), page);
    }

    pub fn launches(&self) -> usize {
        self.counters.launches.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> usize {
        self.counters.navigations.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.counters.releases.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Launcher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn Session>> {
        if !self.available {
            return Err(ScrapeError::DriverUnavailable("no chromium in test".into()));
        }
        self.counters.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            pages: self.pages.clone(),
            counters: self.counters.clone(),
            current: None,
        }))
    }
}

struct FakeSession {
    pages: Arc<Mutex<HashMap<String, FakePage>>>,
    counters: Arc<Counters>,
    current: Option<String>,
}

#[async_trait]
impl Session for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.counters.navigations.fetch_add(1, Ordering::SeqCst);
        let page = self.pages.lock().unwrap().get(url).cloned();
        match page {
            Some(FakePage::Html(html)) => {
                self.current = Some(html);
                Ok(())
            }
            Some(FakePage::NavigationTimeout) => Err(ScrapeError::NavigationTimeout {
                url: url.to_string(),
                secs: 20,
            }),
            Some(FakePage::WaitTimeout) => Err(ScrapeError::WaitTimeout {
                url: url.to_string(),
                secs: 10,
            }),
            None => Err(ScrapeError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".into(),
            }),
        }
    }

    async fn markup(&mut self) -> Result<String> {
        self.current
            .clone()
            .ok_or_else(|| ScrapeError::Browser("nothing loaded".into()))
    }

    async fn release(self: Box<Self>) {
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Store ──

/// A store whose backend is always down.
pub struct FailingStore;

impl RecordStore for FailingStore {
    fn get(&self, _url: &str) -> std::result::Result<Option<CachedRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    fn upsert(
        &self,
        _url: &str,
        _payload: &serde_json::Value,
        _scraped_at: DateTime<Utc>,
    ) -> std::result::Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

// ── Summarizer ──

/// Always answers with the same analysis and remembers what it was sent.
pub struct StaticSummarizer {
    answer: AiAnalysis,
    calls: AtomicUsize,
    last_input: Mutex<String>,
}

impl StaticSummarizer {
    pub fn anvils() -> Self {
        StaticSummarizer {
            answer: AiAnalysis {
                general_summary: Some("Acme sells hand-forged anvils.".into()),
                main_subject: Some("Anvils".into()),
                target_audience: Some("Blacksmiths".into()),
            },
            calls: AtomicUsize::new(0),
            last_input: Mutex::new(String::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_input(&self) -> String {
        self.last_input.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for StaticSummarizer {
    async fn summarize(&self, text: &str) -> std::result::Result<AiAnalysis, AnalyzeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = text.to_string();
        Ok(self.answer.clone())
    }
}

pub struct FailingSummarizer;

#[async_trait]
impl Summarizer for FailingSummarizer {
    async fn summarize(&self, _text: &str) -> std::result::Result<AiAnalysis, AnalyzeError> {
        Err(AnalyzeError::Status {
            status: 503,
            body: "model overloaded".into(),
        })
    }
}
