use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BrowserSettings;
use crate::error::{Result, ScrapeError};

const ROOT_POLL: Duration = Duration::from_millis(100);

/// Starts one browser process per pipeline run.
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn Session>>;
}

/// An exclusively owned browser tab. Callers must finish with [`Session::release`].
#[async_trait]
pub trait Session: Send {
    /// Load `url`, then wait for the document root. Each step has its own timeout.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Rendered markup of the current document.
    async fn markup(&mut self) -> Result<String>;

    /// Shut the browser down. Never fails; problems are logged.
    async fn release(self: Box<Self>);
}

pub struct ChromeLauncher {
    settings: BrowserSettings,
}

impl ChromeLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        ChromeLauncher { settings }
    }

    fn config(&self) -> Result<BrowserConfig> {
        let s = &self.settings;
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", s.user_agent))
            .window_size(s.window_width, s.window_height)
            .viewport(Viewport {
                width: s.window_width,
                height: s.window_height,
                ..Viewport::default()
            })
            .request_timeout(s.page_load_timeout());
        if let Some(path) = &s.chrome_path {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(ScrapeError::DriverUnavailable)
    }
}

#[async_trait]
impl Launcher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn Session>> {
        let config = self.config()?;
        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            ScrapeError::DriverUnavailable(format!("could not start Chromium (check chrome_path): {}", e))
        })?;

        let events = tokio::spawn(async move {
            drain_events(&mut handler).await;
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let session = ChromeSession {
                    browser,
                    page: None,
                    events,
                    page_load: self.settings.page_load_timeout(),
                    dom_wait: self.settings.dom_wait_timeout(),
                };
                Box::new(session).release().await;
                return Err(ScrapeError::DriverUnavailable(format!("could not open a tab: {}", e)));
            }
        };

        info!("Browser session started");
        Ok(Box::new(ChromeSession {
            browser,
            page: Some(page),
            events,
            page_load: self.settings.page_load_timeout(),
            dom_wait: self.settings.dom_wait_timeout(),
        }))
    }
}

struct ChromeSession {
    browser: Browser,
    page: Option<Page>,
    events: JoinHandle<()>,
    page_load: Duration,
    dom_wait: Duration,
}

impl ChromeSession {
    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| ScrapeError::Browser("session has no open tab".into()))
    }
}

#[async_trait]
impl Session for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let page = self.page()?;
        debug!("Navigating to {}", url);

        let load_timeout = ScrapeError::NavigationTimeout {
            url: url.to_string(),
            secs: self.page_load.as_secs(),
        };
        match tokio::time::timeout(self.page_load, page.goto(url)).await {
            Err(_) | Ok(Err(CdpError::Timeout)) => return Err(load_timeout),
            Ok(Err(e)) => {
                return Err(ScrapeError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
            Ok(Ok(_)) => {}
        }

        tokio::time::timeout(self.dom_wait, wait_for_root(page))
            .await
            .map_err(|_| ScrapeError::WaitTimeout {
                url: url.to_string(),
                secs: self.dom_wait.as_secs(),
            })
    }

    async fn markup(&mut self) -> Result<String> {
        self.page()?
            .content()
            .await
            .map_err(|e| ScrapeError::Browser(format!("could not read page source: {}", e)))
    }

    async fn release(mut self: Box<Self>) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Page close error: {}", e);
            }
        }
        if let Err(e) = self.browser.close().await {
            warn!("Browser close error: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Browser process did not exit cleanly: {}", e);
        }
        self.events.abort();
        info!("Browser session released");
    }
}

/// Drive the CDP connection until it closes, skipping undecodable events.
/// Pending commands only resolve while this runs. Returns the error count.
async fn drain_events<S, E>(events: &mut S) -> usize
where
    S: Stream<Item = std::result::Result<(), E>> + Unpin,
    E: std::fmt::Display,
{
    let mut errors = 0;
    while let Some(event) = events.next().await {
        if let Err(e) = event {
            errors += 1;
            debug!("Browser event error: {}", e);
        }
    }
    errors
}

/// Polls until `<body>` exists.
async fn wait_for_root(page: &Page) {
    while page.find_element("body").await.is_err() {
        tokio::time::sleep(ROOT_POLL).await;
    }
}

// ── Tests ──
