//! Per-site HTML schema: which elements hold links, titles and bodies.

use crate::config::SiteQueries;
use crate::error::ConfigError;
use crate::models::RawArticle;
use scraper::{ElementRef, Html, Selector};

/// Compiled CSS selectors for one site.
#[derive(Debug, Clone)]
pub struct SiteSchema {
    homepage_links: Selector,
    article_title: Selector,
    article_body: Selector,
}

fn compile(field: &'static str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::Selector {
        field,
        selector: selector.to_string(),
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").trim().to_string()
}

impl SiteSchema {
    pub fn compile(queries: &SiteQueries) -> Result<Self, ConfigError> {
        Ok(Self {
            homepage_links: compile("homepage_article_links", &queries.homepage_article_links)?,
            article_title: compile("article_title", &queries.article_title)?,
            article_body: compile("article_body", &queries.article_body)?,
        })
    }

    /// Raw `href` values of the homepage article links, in document order.
    pub fn article_links(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        document
            .select(&self.homepage_links)
            .filter_map(|element| element.value().attr("href"))
            .map(str::to_string)
            .collect()
    }

    /// Parse an article page. Title is the first matching element; body is
    /// every matching element, one per line.
    pub fn parse_article(&self, url: &str, html: &str) -> RawArticle {
        let document = Html::parse_document(html);

        let title = document
            .select(&self.article_title)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty());

        let body = document
            .select(&self.article_body)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        RawArticle {
            url: url.to_string(),
            title,
            body: Some(body).filter(|b| !b.is_empty()),
        }
    }
}
