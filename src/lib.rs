pub mod analyzer;
pub mod batch;
pub mod browser;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod scraper;
pub mod techstack;

#[cfg(test)]
mod testing;

pub use config::Settings;
pub use error::{AnalyzeError, ScrapeError, StoreError};
pub use model::{AiAnalysis, HomeDossier, ScrapeResult, SubpageDossier};
pub use pipeline::{AccessGate, Degraded, Pipeline, ScrapeOutcome, Source, Stage};
