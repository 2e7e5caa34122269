//! The per-site collection loop.
//!
//! Every homepage link is resolved, fetched and kept only when it produced an
//! article. A failed link never stops the loop. With `concurrency > 1` several
//! fetches are in flight at once, but results are still assembled in link
//! order so the batch is reproducible.

use crate::config::SiteConfig;
use crate::error::HomepageError;
use crate::models::RawArticle;
use crate::scrapers::article::{ArticleFetcher, FetchOutcome};
use crate::scrapers::homepage;
use crate::scrapers::links::resolve;
use crate::scrapers::transport::PageSource;
use futures::stream::{self, StreamExt};
use tracing::{info, instrument};

/// Per-outcome counts for one collection run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    pub articles: usize,
    pub empty_body: usize,
    pub network_errors: usize,
    pub http_errors: usize,
}

impl CollectStats {
    fn record(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Article(_) => self.articles += 1,
            FetchOutcome::EmptyBody => self.empty_body += 1,
            FetchOutcome::NetworkError(_) => self.network_errors += 1,
            FetchOutcome::HttpError(_) => self.http_errors += 1,
        }
    }
}

/// Fetch every link of `links` for `site` and return the articles found.
///
/// Each link is resolved against the site's base host first. Up to
/// `concurrency` fetches run at once (`0` is treated as `1`); failures are
/// counted and skipped, never propagated.
///
/// # Arguments
///
/// * `source` - Page source used for every request
/// * `site` - Site whose base host and selectors apply
/// * `links` - Raw hrefs in homepage order
/// * `concurrency` - Maximum fetches in flight
///
/// # Returns
///
/// The articles in link order, plus per-outcome counts. An empty list is a
/// valid outcome.
#[instrument(level = "info", skip_all, fields(site = %site.uid, links = links.len()))]
pub async fn collect<S: PageSource>(
    source: &S,
    site: &SiteConfig,
    links: Vec<String>,
    concurrency: usize,
) -> (Vec<RawArticle>, CollectStats) {
    let fetcher = ArticleFetcher::new(source, site);
    let fetcher = &fetcher;
    let base_host = site.base_host.as_str();

    let outcomes: Vec<FetchOutcome> = stream::iter(links)
        .map(move |link| async move {
            let url = resolve(base_host, &link);
            fetcher.fetch(&url).await
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut stats = CollectStats::default();
    let mut articles = Vec::new();
    for outcome in outcomes {
        stats.record(&outcome);
        if let Some(article) = outcome.into_article() {
            articles.push(article);
        }
    }

    info!(
        articles = stats.articles,
        empty_body = stats.empty_body,
        network_errors = stats.network_errors,
        http_errors = stats.http_errors,
        "Collected articles"
    );
    (articles, stats)
}

/// Discover homepage links for `site` and collect its articles.
pub async fn scrape_site<S: PageSource>(
    source: &S,
    site: &SiteConfig,
    concurrency: usize,
) -> Result<Vec<RawArticle>, HomepageError> {
    let links = homepage::article_links(source, site).await?;
    let (articles, _) = collect(source, site, links, concurrency).await;
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::scrapers::article::tests::{EMPTY_PAGE, GOOD_PAGE, StubSource, site};

    fn source() -> StubSource {
        StubSource::default()
            .with("https://n.com/a", Ok(GOOD_PAGE))
            .with("https://n.com/b", Ok(EMPTY_PAGE))
            .with("https://n.com/c", Err(TransportError::Status(404)))
            .with("https://other.com/d", Ok(GOOD_PAGE))
            .with("https://n.com/e/f", Ok(GOOD_PAGE))
    }

    fn links() -> Vec<String> {
        ["/a", "b", "/c", "https://other.com/d", "missing", "e/f", "/a"]
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_collect_keeps_only_articles_in_link_order() {
        let (articles, stats) = collect(&source(), &site(), links(), 1).await;
        let urls: Vec<&str> = articles.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://n.com/a",
                "https://other.com/d",
                "https://n.com/e/f",
                "https://n.com/a",
            ]
        );
        assert_eq!(
            stats,
            CollectStats {
                articles: 4,
                empty_body: 1,
                network_errors: 1,
                http_errors: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_concurrent_collect_preserves_order() {
        let (sequential, _) = collect(&source(), &site(), links(), 1).await;
        let (concurrent, _) = collect(&source(), &site(), links(), 4).await;
        assert_eq!(sequential, concurrent);
    }

    #[tokio::test]
    async fn test_no_links_is_not_an_error() {
        let (articles, stats) = collect(&source(), &site(), Vec::new(), 1).await;
        assert!(articles.is_empty());
        assert_eq!(stats, CollectStats::default());
    }

    #[tokio::test]
    async fn test_scrape_site_end_to_end() {
        let homepage = r#"<a class="story" href="/a">A</a><a class="story" href="/b">B</a>"#;
        let source = source().with("https://n.com", Ok(homepage));
        let articles = scrape_site(&source, &site(), 1).await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title.as_deref(), Some("Titulo"));
    }
}
