//! # News Harvest
//!
//! Harvests articles from configured news sites and turns them into a
//! canonical, deduplicated dataset.
//!
//! ## Usage
//!
//! ```sh
//! news_harvest scrape eluniversal -o ./data
//! news_harvest clean ./data/eluniversal_2025_05_06_articles.csv
//! news_harvest load ./data/clean_eluniversal_2025_05_06_articles.csv
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Indexing**: Discover article links on each site's homepage
//! 2. **Fetching**: Resolve and download every link, keeping pages with a body
//! 3. **Cleaning**: Tag, backfill, hash, normalize, count, dedupe and filter rows
//! 4. **Loading**: Merge the canonical records into the JSON article store

use clap::Parser;
use encoding_rs::Encoding;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cleaning;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod scrapers;
mod utils;

use cleaning::CleaningPipeline;
use cli::{Cli, Command};
use config::{Config, SiteConfig};
use outputs::dataset::{self, clean_file_path, encoding_for_label, newspaper_uid_from_path};
use outputs::json::JsonSink;
use scrapers::collect::scrape_site;
use scrapers::transport::{HttpTransport, PageSource, RetryTransport};
use utils::{ensure_writable_dir, run_date};

/// First backoff delay of the transport retry loop.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_harvest starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = load_config(&args)?;
    let encoding = encoding_for_label(&config.encoding)?;

    match args.command {
        Command::Scrape { sites, output_dir } => {
            let sites = resolve_sites(&config, &sites)?;
            ensure_writable_dir(&output_dir).await?;
            let transport = transport(&config)?;

            let mut failed = 0usize;
            for site in &sites {
                if scrape(&transport, &config, site, &output_dir, encoding)
                    .await
                    .is_none()
                {
                    failed += 1;
                }
            }
            if failed > 0 {
                return Err(format!("{failed} of {} site(s) failed to scrape", sites.len()).into());
            }
        }
        Command::Clean { file } => {
            let (clean_path, rows) = clean(&config, &file, encoding)?;
            println!("{}", clean_report(&clean_path, rows));
        }
        Command::Load { file, store } => {
            load(&file, &JsonSink::new(store), encoding).await?;
        }
        Command::Run {
            sites,
            output_dir,
            store,
        } => {
            let sites = resolve_sites(&config, &sites)?;
            ensure_writable_dir(&output_dir).await?;
            let transport = transport(&config)?;
            let sink = JsonSink::new(store);

            let mut failed = 0usize;
            for site in &sites {
                let Some(raw_path) = scrape(&transport, &config, site, &output_dir, encoding).await
                else {
                    failed += 1;
                    continue;
                };
                let (clean_path, _) = clean(&config, &raw_path, encoding)?;
                load(&clean_path, &sink, encoding).await?;
            }
            if failed > 0 {
                return Err(format!("{failed} of {} site(s) failed to scrape", sites.len()).into());
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

/// Load the config file. `clean` and `load` only need the encoding and
/// cleaning settings, so they fall back to defaults when the file is absent.
fn load_config(args: &Cli) -> Result<Config, Box<dyn Error>> {
    let needs_sites = matches!(args.command, Command::Scrape { .. } | Command::Run { .. });
    if !needs_sites && !args.config.exists() {
        warn!(path = %args.config.display(), "Config file not found; using defaults");
        return Ok(Config::default());
    }
    Ok(Config::load(&args.config)?)
}

/// Resolve every requested site up front so a typo fails before any fetch.
fn resolve_sites(config: &Config, uids: &[String]) -> Result<Vec<SiteConfig>, Box<dyn Error>> {
    let sites = uids
        .iter()
        .map(|uid| config.site(uid))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(sites)
}

fn transport(config: &Config) -> Result<RetryTransport<HttpTransport>, Box<dyn Error>> {
    let http = HttpTransport::new(&config.fetch)?;
    Ok(RetryTransport::new(
        http,
        config.fetch.max_retries,
        RETRY_BASE_DELAY,
    ))
}

/// Scrape one site into its raw dataset file. Returns `None` when the site
/// failed; the error has already been logged.
#[instrument(level = "info", skip_all, fields(site = %site.uid))]
async fn scrape<S: PageSource>(
    source: &S,
    config: &Config,
    site: &SiteConfig,
    output_dir: &Path,
    encoding: &'static Encoding,
) -> Option<PathBuf> {
    let articles = match scrape_site(source, site, config.fetch.concurrency).await {
        Ok(articles) => articles,
        Err(e) => {
            error!(error = %e, "Scrape failed");
            return None;
        }
    };

    let path = output_dir.join(dataset::raw_file_name(&site.uid, run_date()));
    if let Err(e) = dataset::write_raw(&path, &articles, encoding) {
        error!(path = %path.display(), error = %e, "Failed to write raw dataset");
        return None;
    }
    info!(path = %path.display(), articles = articles.len(), "Saved articles");
    Some(path)
}

/// Clean a raw dataset file and write the `clean_` file next to it.
///
/// # Returns
///
/// The path of the cleaned file and the number of rows written to it.
///
/// # Errors
///
/// Fails when the file name carries no newspaper uid, when the raw file
/// cannot be read or lacks a required column, or when the cleaned file
/// cannot be written.
#[instrument(level = "info", skip_all, fields(file = %raw_path.display()))]
fn clean(
    config: &Config,
    raw_path: &Path,
    encoding: &'static Encoding,
) -> Result<(PathBuf, usize), Box<dyn Error>> {
    let newspaper_uid = newspaper_uid_from_path(raw_path)?;
    info!(%newspaper_uid, "Newspaper uid detected");

    let raw = dataset::read_raw(raw_path, encoding)?;
    let pipeline = CleaningPipeline::new(config.cleaning.stop_words());
    let records = pipeline.clean(raw, &newspaper_uid);

    let clean_path = clean_file_path(raw_path);
    dataset::write_canonical(&clean_path, &records, encoding)?;
    info!(path = %clean_path.display(), rows = records.len(), "Saved clean dataset");
    Ok((clean_path, records.len()))
}

/// One-line summary printed by the `clean` command.
fn clean_report(clean_path: &Path, rows: usize) -> String {
    format!("{} rows -> {}", rows, clean_path.display())
}

/// Load a cleaned dataset file into the article store.
async fn load(
    clean_path: &Path,
    sink: &JsonSink,
    encoding: &'static Encoding,
) -> Result<(), Box<dyn Error>> {
    let records = dataset::read_canonical(clean_path, encoding)?;
    let summary = sink.write_records(&records).await?;
    info!(
        file = %clean_path.display(),
        store = %sink.path().display(),
        inserted = summary.inserted,
        replaced = summary.replaced,
        "Loaded clean dataset"
    );
    Ok(())
}
