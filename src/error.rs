use thiserror::Error;

/// Errors that end a scrape request. Anything softer is reported as
/// [`crate::pipeline::Degraded`] instead.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Caller is not allowed to run the scrape pipeline")]
    Unauthorized,

    #[error("Browser driver unavailable: {0}")]
    DriverUnavailable(String),

    #[error("Timeout: {url} did not finish loading within {secs}s")]
    NavigationTimeout { url: String, secs: u64 },

    #[error("Timeout: document root of {url} not present after {secs}s")]
    WaitTimeout { url: String, secs: u64 },

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Browser error: {0}")]
    Browser(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Payload encoding error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Stored timestamp out of range: {0}")]
    Timestamp(i64),

    #[error("Store connection lock poisoned")]
    Poisoned,

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("no summarizer API key configured")]
    MissingCredential,

    #[error("summarizer request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("summarizer returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed summarizer response: {0}")]
    Malformed(String),

    #[error("unexpected summary schema: {0}")]
    Schema(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
