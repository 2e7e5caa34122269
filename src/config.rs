//! YAML configuration: news sites, fetch settings and cleaning settings.
//!
//! The file is read once at start-up and never mutated afterwards.
//!
//! ```yaml
//! news_sites:
//!   eluniversal:
//!     url: https://www.eluniversal.com.mx
//!     queries:
//!       homepage_article_links: ".field-content a"
//!       article_title: ".pane-content h1"
//!       article_body: ".pane-content p"
//! cleaning:
//!   language: spanish
//! fetch:
//!   timeout_secs: 30
//! ```

use crate::cleaning::stopwords::Language;
use crate::error::ConfigError;
use crate::scrapers::schema::SiteSchema;
use itertools::Itertools;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// Default encoding label for dataset files. WHATWG resolves `iso-8859-1`
/// to windows-1252, so the two are interchangeable here.
pub const DEFAULT_ENCODING: &str = "windows-1252";

/// The whole configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub news_sites: BTreeMap<String, SiteEntry>,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub cleaning: CleaningConfig,
    /// Text encoding label used for the dataset files.
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

fn default_encoding() -> String {
    DEFAULT_ENCODING.to_string()
}

/// One entry under `news_sites`.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    /// Base host, e.g. `https://example.com`.
    pub url: String,
    pub queries: SiteQueries,
}

/// CSS selectors describing where a site keeps its links, titles and bodies.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteQueries {
    pub homepage_article_links: String,
    pub article_title: String,
    pub article_body: String,
}

/// A resolved site, ready to be scraped.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub uid: String,
    pub base_host: String,
    pub schema: SiteSchema,
}

/// Transport settings shared by every site.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout, covering connect and body read.
    pub timeout_secs: u64,
    /// Retries on network errors; HTTP status errors are never retried.
    pub max_retries: usize,
    /// Articles fetched at once per site. `1` fetches strictly in order.
    pub concurrency: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            concurrency: 1,
            user_agent: format!("news_harvest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings for the cleaning pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub language: Language,
    /// Additional words to exclude from token counts.
    pub extra_stop_words: Vec<String>,
}

impl CleaningConfig {
    /// Build the stop-word set for one pipeline instance.
    pub fn stop_words(&self) -> HashSet<String> {
        self.language
            .stop_words()
            .iter()
            .map(|w| w.to_string())
            .chain(self.extra_stop_words.iter().map(|w| w.to_lowercase()))
            .collect()
    }
}

impl Default for Config {
    /// No sites; default fetch, cleaning and encoding settings.
    fn default() -> Self {
        Self {
            news_sites: BTreeMap::new(),
            fetch: FetchConfig::default(),
            cleaning: CleaningConfig::default(),
            encoding: default_encoding(),
        }
    }
}

impl Config {
    /// Load and parse the configuration file at `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml(&text).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })?;
        info!(sites = config.news_sites.len(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Configured site identifiers, sorted.
    pub fn site_uids(&self) -> Vec<&str> {
        self.news_sites.keys().map(String::as_str).collect()
    }

    /// Resolve one site by identifier, compiling its selectors.
    pub fn site(&self, uid: &str) -> Result<SiteConfig, ConfigError> {
        let entry = self
            .news_sites
            .get(uid)
            .ok_or_else(|| ConfigError::UnknownSite {
                uid: uid.to_string(),
                known: self.site_uids().iter().join(", "),
            })?;
        Ok(SiteConfig {
            uid: uid.to_string(),
            base_host: entry.url.trim_end_matches('/').to_string(),
            schema: SiteSchema::compile(&entry.queries)?,
        })
    }
}
