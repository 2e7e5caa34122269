//! Discovering article links on a site's homepage.

use crate::config::SiteConfig;
use crate::error::HomepageError;
use crate::scrapers::transport::PageSource;
use tracing::{debug, info, instrument};

/// Fetch the homepage of `site` and return its raw article `href`s in
/// document order. Duplicates and malformed links are kept as found.
#[instrument(level = "info", skip_all, fields(site = %site.uid, url = %site.base_host))]
pub async fn article_links<S: PageSource>(
    source: &S,
    site: &SiteConfig,
) -> Result<Vec<String>, HomepageError> {
    info!("Beginning scraper");
    let html = source
        .get_page(&site.base_host)
        .await
        .map_err(|source| HomepageError {
            url: site.base_host.clone(),
            source,
        })?;

    let links = site.schema.article_links(&html);
    info!(count = links.len(), "Indexed homepage article links");
    debug!(links = ?links, "Homepage links");
    Ok(links)
}
