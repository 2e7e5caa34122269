//! Fetching a single article page.
//!
//! [`ArticleFetcher::fetch`] makes exactly one request through its
//! [`PageSource`] (retries belong to the transport) and reports the result as
//! a [`FetchOutcome`]. Only [`FetchOutcome::Article`] carries a usable
//! article; the other variants say why there is none.

use crate::config::SiteConfig;
use crate::error::TransportError;
use crate::models::RawArticle;
use crate::scrapers::transport::PageSource;
use crate::utils::truncate_for_log;
use tracing::{debug, instrument, warn};

/// Result of fetching one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Fetched and parsed with a non-empty body.
    Article(RawArticle),
    /// Fetched, but the schema found no body text.
    EmptyBody,
    /// DNS, connection, timeout or retry exhaustion.
    NetworkError(String),
    /// The server answered 4xx/5xx.
    HttpError(u16),
}

impl FetchOutcome {
    /// The article, if this outcome produced one.
    pub fn into_article(self) -> Option<RawArticle> {
        match self {
            FetchOutcome::Article(article) => Some(article),
            _ => None,
        }
    }
}

/// Fetches and parses articles for one site.
#[derive(Debug)]
pub struct ArticleFetcher<'a, S> {
    source: &'a S,
    site: &'a SiteConfig,
}

impl<'a, S> ArticleFetcher<'a, S>
where
    S: PageSource,
{
    pub fn new(source: &'a S, site: &'a SiteConfig) -> Self {
        Self { source, site }
    }

    #[instrument(level = "debug", skip(self), fields(site = %self.site.uid))]
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let html = match self.source.get_page(url).await {
            Ok(html) => html,
            Err(TransportError::Network(e)) => {
                warn!(%url, error = %e, "Network error while fetching article");
                return FetchOutcome::NetworkError(e);
            }
            Err(TransportError::Status(status)) => {
                warn!(%url, status, "HTTP error while fetching article");
                return FetchOutcome::HttpError(status);
            }
        };

        let article = self.site.schema.parse_article(url, &html);
        match article.body.as_deref() {
            Some(body) if !body.is_empty() => {
                debug!(
                    %url,
                    bytes = body.len(),
                    preview = %truncate_for_log(body, 80),
                    "Parsed article"
                );
                FetchOutcome::Article(article)
            }
            _ => {
                warn!(%url, "Invalid article, there is no body");
                FetchOutcome::EmptyBody
            }
        }
    }
}
