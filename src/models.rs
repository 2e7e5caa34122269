//! Data models for scraped and cleaned articles.
//!
//! - [`RawArticle`]: one article as parsed from a site, before cleaning
//! - [`CanonicalRecord`]: a validated, deduplicated row ready for storage
//!
//! Column order for the dataset files is fixed by [`RAW_COLUMNS`] and
//! [`CANONICAL_COLUMNS`]. The CSV reader and writer and the record types all
//! share these lists; bump [`SCHEMA_VERSION`] when either changes.

use serde::{Deserialize, Serialize};

/// Version of the column layout below.
pub const SCHEMA_VERSION: u32 = 1;

/// Header of a scraped (raw) dataset file.
pub const RAW_COLUMNS: [&str; 3] = ["body", "title", "url"];

/// Header of a cleaned dataset file. `uid` leads as the row index.
pub const CANONICAL_COLUMNS: [&str; 8] = [
    "uid",
    "body",
    "title",
    "url",
    "newspaper_uid",
    "host",
    "n_tokens_title",
    "n_tokens_body",
];

/// An article as scraped from a news site.
///
/// `title` and `body` are optional because the site schema may not match
/// anything on the page. The fetcher never hands out an article without a
/// body, but rows read back from a raw dataset file may still lack one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArticle {
    /// The resolved URL the article was fetched from.
    pub url: String,
    pub title: Option<String>,
    pub body: Option<String>,
}

impl RawArticle {
    /// Cells in [`RAW_COLUMNS`] order; absent values become empty cells.
    pub fn to_row(&self) -> [&str; 3] {
        [
            self.body.as_deref().unwrap_or(""),
            self.title.as_deref().unwrap_or(""),
            &self.url,
        ]
    }
}

/// A fully cleaned article row.
///
/// Every field is populated: the cleaning pipeline drops any row that
/// cannot fill all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Hex content hash of `url`; the primary key.
    pub uid: String,
    pub url: String,
    pub title: String,
    /// Article text on a single line.
    pub body: String,
    /// Network authority of `url`.
    pub host: String,
    pub newspaper_uid: String,
    pub n_tokens_title: u64,
    pub n_tokens_body: u64,
}

impl CanonicalRecord {
    /// Cells in [`CANONICAL_COLUMNS`] order.
    pub fn to_row(&self) -> [String; 8] {
        [
            self.uid.clone(),
            self.body.clone(),
            self.title.clone(),
            self.url.clone(),
            self.newspaper_uid.clone(),
            self.host.clone(),
            self.n_tokens_title.to_string(),
            self.n_tokens_body.to_string(),
        ]
    }
}
