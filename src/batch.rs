use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::pipeline::{Pipeline, Source};

/// Totals returned after a batch completes.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub total: usize,
    pub fresh: usize,
    pub cached: usize,
    pub degraded: usize,
    pub errors: usize,
}

struct BatchItem {
    url: String,
    outcome: Result<(Source, usize), String>,
}

/// Run one pipeline request per URL, at most `concurrency` at a time.
/// Each request still owns its own browser.
pub async fn scrape_batch(
    pipeline: Arc<Pipeline>,
    urls: Vec<String>,
    concurrency: usize,
    progress: bool,
) -> anyhow::Result<BatchStats> {
    let concurrency = concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let total = urls.len();

    let pb = if progress {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
                .progress_chars("=> "),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let (tx, mut rx) = tokio::sync::mpsc::channel::<BatchItem>(concurrency * 2);

    for url in urls {
        let pipeline = Arc::clone(&pipeline);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire_owned().await else {
                return;
            };
            let outcome = match pipeline.run(&url).await {
                Ok(o) => Ok((o.source, o.degraded.len())),
                Err(e) => Err(e.to_string()),
            };
            // Callers may reclaim the pipeline once the channel closes.
            drop(pipeline);
            let _ = tx.send(BatchItem { url, outcome }).await;
        });
    }

    // rx closes once every task has dropped its sender
    drop(tx);

    let mut stats = BatchStats {
        total,
        ..Default::default()
    };
    while let Some(item) = rx.recv().await {
        match item.outcome {
            Ok((source, degraded)) => {
                match source {
                    Source::Cache => stats.cached += 1,
                    Source::Fresh => stats.fresh += 1,
                }
                if degraded > 0 {
                    stats.degraded += 1;
                }
            }
            Err(e) => {
                warn!("Scrape failed for {}: {}", item.url, e);
                stats.errors += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        "Batch of {} done ({} fresh, {} cached, {} errors)",
        stats.total, stats.fresh, stats.cached, stats.errors
    );
    Ok(stats)
}

/// One URL per line; blank lines and `#` comments skipped.
pub fn read_url_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Analyzer;
    use crate::cache::CacheStore;
    use crate::db::SqliteStore;
    use crate::testing::{FakeLauncher, FakePage};

    fn page(title: &str) -> FakePage {
        FakePage::Html(format!(
            "<html><head><title>{}</title></head><body><p>hello</p></body></html>",
            title
        ))
    }

    #[test]
    fn url_list_skips_blanks_and_comments() {
        let urls = read_url_list("https://a.example\n\n  # later\n https://b.example/ \n");
        assert_eq!(urls, vec!["https://a.example", "https://b.example/"]);
    }

    #[tokio::test]
    async fn counts_fresh_cached_and_errors() {
        let launcher = Arc::new(
            FakeLauncher::new()
                .page("https://a.example", page("A"))
                .page("https://b.example", page("B")),
        );
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let pipeline = Arc::new(Pipeline::new(
            launcher.clone(),
            CacheStore::new(store, chrono::Duration::days(1)),
            Analyzer::disabled(),
            5,
        ));

        pipeline.run("https://a.example").await.unwrap();

        let urls = vec![
            "https://a.example".to_string(),
            "https://b.example".to_string(),
            "not a url".to_string(),
        ];
        let stats = scrape_batch(pipeline, urls, 2, false).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.cached, 1);
        assert_eq!(stats.fresh, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(launcher.launches(), 2);
    }
}
