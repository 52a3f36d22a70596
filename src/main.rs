use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};

use site_dossier::batch;
use site_dossier::db::{self, RecordStore, SqliteStore};
use site_dossier::normalize::normalize;
use site_dossier::{Pipeline, Settings};

#[derive(Parser)]
#[command(name = "site_dossier", about = "Cache-first website dossier builder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the cache database
    Init,
    /// Build the dossier for one URL (served from cache when fresh)
    Scrape {
        url: String,
        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,
    },
    /// Scrape every URL in a file, one per line
    Batch {
        file: String,
        /// Concurrent pipeline runs (each launches its own browser)
        #[arg(short = 'c', long, default_value = "3")]
        concurrency: usize,
    },
    /// Print the cached dossier for a URL, regardless of age
    Show { url: String },
    /// Cached URLs, newest first
    List {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Cache statistics
    Stats,
    /// Delete every cached record
    ClearCache,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Init => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            println!("Cache ready at {}", settings.db_path.display());
            Ok(())
        }
        Commands::Scrape { url, pretty } => {
            let pipeline = Pipeline::from_settings(&settings)?;
            let outcome = pipeline.run(&url).await;
            pipeline.shutdown();
            let outcome = outcome?;

            for d in &outcome.degraded {
                tracing::warn!("Degraded: {:?}", d);
            }
            let json = if pretty {
                serde_json::to_string_pretty(&outcome.result)?
            } else {
                serde_json::to_string(&outcome.result)?
            };
            println!("{}", json);
            Ok(())
        }
        Commands::Batch { file, concurrency } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file))?;
            let urls = batch::read_url_list(&contents);
            if urls.is_empty() {
                println!("No URLs in {}.", file);
                return Ok(());
            }

            println!("Scraping {} URLs ({} at a time)...", urls.len(), concurrency);
            let pipeline = Arc::new(Pipeline::from_settings(&settings)?);
            let stats = batch::scrape_batch(Arc::clone(&pipeline), urls, concurrency, true).await?;
            println!(
                "Done: {} URLs ({} fresh, {} cached, {} degraded, {} errors).",
                stats.total, stats.fresh, stats.cached, stats.degraded, stats.errors
            );
            match Arc::try_unwrap(pipeline) {
                Ok(pipeline) => pipeline.shutdown(),
                Err(_) => tracing::warn!("Pipeline still shared; skipping checkpoint"),
            }
            Ok(())
        }
        Commands::Show { url } => {
            let target = normalize(&url)?;
            let store = SqliteStore::open(&settings.db_path)?;
            match store.get(&target.canonical)? {
                Some(record) => {
                    let age = Utc::now() - record.scraped_at;
                    println!("# {} (cached {} ago)", record.url, format_age(age));
                    println!("{}", serde_json::to_string_pretty(&record.payload)?);
                }
                None => println!("Nothing cached for {}.", target.canonical),
            }
            Ok(())
        }
        Commands::List { limit } => {
            let store = SqliteStore::open(&settings.db_path)?;
            let rows = store.list(limit)?;
            if rows.is_empty() {
                println!("Cache is empty.");
                return Ok(());
            }

            let now = Utc::now();
            let ttl = settings.cache.ttl();
            println!("{:>3} | {:<60} | {:>10} | {:<5}", "#", "URL", "Age", "Fresh");
            println!("{}", "-".repeat(88));
            for (i, r) in rows.iter().enumerate() {
                let age = now - r.scraped_at;
                println!(
                    "{:>3} | {:<60} | {:>10} | {:<5}",
                    i + 1,
                    truncate(&r.url, 60),
                    format_age(age),
                    if age < ttl { "yes" } else { "no" }
                );
            }
            println!("\n{} records", rows.len());
            Ok(())
        }
        Commands::Stats => {
            let store = SqliteStore::open(&settings.db_path)?;
            let s = store.stats(Utc::now(), settings.cache.ttl())?;
            println!("Total:  {}", s.total);
            println!("Fresh:  {}", s.fresh);
            println!("Stale:  {}", s.stale);
            println!("TTL:    {}h", settings.cache.ttl_hours);
            Ok(())
        }
        Commands::ClearCache => {
            let store = SqliteStore::open(&settings.db_path)?;
            let removed = store.clear()?;
            store.checkpoint()?;
            println!("Removed {} cached records.", removed);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn format_age(age: chrono::Duration) -> String {
    let secs = age.num_seconds().max(0);
    if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86_400, (secs % 86_400) / 3600)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
