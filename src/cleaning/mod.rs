//! Batch cleaning of scraped articles into canonical records.
//!
//! [`CleaningPipeline::clean`] runs these stages in order over one batch:
//!
//! 1. tag every row with the newspaper uid
//! 2. extract the host from the url
//! 3. backfill missing titles from the last url path segment
//! 4. derive the row uid from a hash of the url
//! 5. flatten line breaks in the body
//! 6. count relevant tokens in title and body
//! 7. drop rows repeating an earlier title
//! 8. drop rows still missing a required field
//!
//! A url scraped twice would repeat a uid, so among the surviving records
//! only the first per uid is kept. That check runs after stage 8: an
//! incomplete earlier copy must not shadow a complete later one.
//!
//! Backfill runs before counting and deduplication because it can complete a
//! row. The uid is derived from the url alone so text changes never move it.
//! Completeness filtering is last so earlier stages may leave holes.
//!
//! Rows that cannot be completed are dropped silently; the pipeline itself
//! never fails once it has a well-formed batch.

pub mod stopwords;
pub mod tokens;

use crate::models::{CanonicalRecord, RawArticle};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tokens::count_relevant_tokens;
use tracing::{debug, info, instrument};
use url::Url;

static LAST_PATH_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^/]+$").unwrap());
static AUTHORITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://([^/?#]*)").unwrap());

/// Working row while the batch moves through the stages.
#[derive(Debug, Clone, Default)]
struct Row {
    url: String,
    title: Option<String>,
    body: Option<String>,
    newspaper_uid: String,
    host: String,
    uid: String,
    n_tokens_title: Option<u64>,
    n_tokens_body: Option<u64>,
}

impl From<RawArticle> for Row {
    fn from(article: RawArticle) -> Self {
        Self {
            url: article.url,
            title: article.title.filter(|t| !t.is_empty()),
            body: article.body.filter(|b| !b.is_empty()),
            ..Self::default()
        }
    }
}

/// Turns raw article batches into canonical records.
///
/// The stop-word set belongs to the instance, so pipelines for different
/// languages can coexist.
#[derive(Debug, Clone)]
pub struct CleaningPipeline {
    stop_words: HashSet<String>,
}

impl CleaningPipeline {
    pub fn new(stop_words: HashSet<String>) -> Self {
        Self { stop_words }
    }

    /// Clean one batch. The output keeps the input's relative order.
    #[instrument(level = "info", skip_all, fields(%newspaper_uid, rows = raw_batch.len()))]
    pub fn clean(&self, raw_batch: Vec<RawArticle>, newspaper_uid: &str) -> Vec<CanonicalRecord> {
        info!("Starting cleaning process");
        let input_rows = raw_batch.len();
        let rows: Vec<Row> = raw_batch.into_iter().map(Row::from).collect();

        let rows = add_newspaper_uid(rows, newspaper_uid);
        let rows = extract_host(rows);
        let rows = add_missing_titles(rows);
        let rows = generate_uids(rows);
        let rows = remove_new_lines_from_body(rows);
        let rows = self.count_tokens(rows);
        let rows = remove_duplicate_entries(rows);
        let records = drop_rows_missing_data(rows);
        let records = keep_first_per_uid(records);

        info!(
            input = input_rows,
            output = records.len(),
            dropped = input_rows - records.len(),
            "Cleaning complete"
        );
        records
    }

    fn count_tokens(&self, mut rows: Vec<Row>) -> Vec<Row> {
        info!("Counting relevant words in title and body");
        for row in &mut rows {
            row.n_tokens_title = row
                .title
                .as_deref()
                .map(|t| count_relevant_tokens(t, &self.stop_words));
            row.n_tokens_body = row
                .body
                .as_deref()
                .map(|b| count_relevant_tokens(b, &self.stop_words));
        }
        rows
    }
}

/// Hex SHA-256 of the url bytes; stable across runs.
pub fn url_uid(url: &str) -> String {
    format!("{:x}", Sha256::digest(url.as_bytes()))
}

/// Network authority of `url`, exactly as written.
///
/// User info, explicit ports and letter case are kept and international
/// domains are not punycoded. Returns an empty string when `url` does not
/// parse or its authority is empty (`https:///path`).
pub fn url_host(url: &str) -> String {
    if Url::parse(url).is_err() {
        return String::new();
    }
    AUTHORITY
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|authority| authority.as_str().to_string())
        .unwrap_or_default()
}

/// Title derived from the final url path segment, hyphens turned into spaces.
///
/// Returns `None` when the url ends in `/` and so has no final segment.
pub fn title_from_url(url: &str) -> Option<String> {
    LAST_PATH_SEGMENT
        .find(url)
        .map(|segment| segment.as_str().split('-').join(" "))
}

/// Replace each line feed and carriage return with one space.
pub fn flatten_line_breaks(body: &str) -> String {
    body.chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

fn add_newspaper_uid(mut rows: Vec<Row>, newspaper_uid: &str) -> Vec<Row> {
    info!(%newspaper_uid, "Adding newspaper_uid column");
    for row in &mut rows {
        row.newspaper_uid = newspaper_uid.to_string();
    }
    rows
}

fn extract_host(mut rows: Vec<Row>) -> Vec<Row> {
    info!("Extracting host from urls");
    for row in &mut rows {
        row.host = url_host(&row.url);
        if row.host.is_empty() {
            debug!(url = %row.url, "Url has no host");
        }
    }
    rows
}

fn add_missing_titles(mut rows: Vec<Row>) -> Vec<Row> {
    info!("Filling missing titles");
    for row in rows.iter_mut().filter(|r| r.title.is_none()) {
        row.title = title_from_url(&row.url);
        debug!(url = %row.url, title = ?row.title, "Backfilled title");
    }
    rows
}

fn generate_uids(mut rows: Vec<Row>) -> Vec<Row> {
    info!("Generating uids for each row");
    for row in &mut rows {
        row.uid = url_uid(&row.url);
    }
    rows
}

fn remove_new_lines_from_body(mut rows: Vec<Row>) -> Vec<Row> {
    info!("Removing new lines from body");
    for row in &mut rows {
        if let Some(body) = row.body.as_mut() {
            *body = flatten_line_breaks(body);
        }
    }
    rows
}

fn remove_duplicate_entries(rows: Vec<Row>) -> Vec<Row> {
    info!("Removing duplicate entries in title");
    let before = rows.len();
    let rows: Vec<Row> = rows.into_iter().unique_by(|r| r.title.clone()).collect();
    debug!(removed = before - rows.len(), "Removed duplicates");
    rows
}

fn drop_rows_missing_data(rows: Vec<Row>) -> Vec<CanonicalRecord> {
    info!("Dropping rows with missing data");
    rows.into_iter()
        .filter_map(|row| {
            let title = row.title.filter(|t| !t.is_empty())?;
            let body = row.body.filter(|b| !b.is_empty())?;
            if row.host.is_empty() {
                return None;
            }
            Some(CanonicalRecord {
                uid: row.uid,
                url: row.url,
                title,
                body,
                host: row.host,
                newspaper_uid: row.newspaper_uid,
                n_tokens_title: row.n_tokens_title?,
                n_tokens_body: row.n_tokens_body?,
            })
        })
        .collect()
}

fn keep_first_per_uid(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    let before = records.len();
    let records: Vec<CanonicalRecord> = records
        .into_iter()
        .unique_by(|r| r.uid.clone())
        .collect();
    if records.len() < before {
        debug!(removed = before - records.len(), "Removed repeated urls");
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use stopwords::Language;

    fn pipeline() -> CleaningPipeline {
        CleaningPipeline::new(
            Language::Spanish
                .stop_words()
                .iter()
                .map(|w| w.to_string())
                .collect(),
        )
    }

    fn raw(url: &str, title: Option<&str>, body: Option<&str>) -> RawArticle {
        RawArticle {
            url: url.to_string(),
            title: title.map(str::to_string),
            body: body.map(str::to_string),
        }
    }

    #[test]
    fn test_end_to_end_batch() {
        let batch = vec![
            raw("https://n.com/x-y-z", None, Some("Hola\nMundo")),
            raw("https://n.com/other", Some("T1"), Some("Texto valido")),
            raw("https://n.com/third", Some("T1"), Some("Otro texto")),
        ];
        let records = pipeline().clean(batch, "n");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "x y z");
        assert_eq!(records[0].body, "Hola Mundo");
        assert_eq!(records[0].host, "n.com");
        assert_eq!(records[0].newspaper_uid, "n");
        assert_eq!(records[1].url, "https://n.com/other");
        assert_eq!(records[1].body, "Texto valido");
        assert_eq!(records[0].uid, url_uid("https://n.com/x-y-z"));
        assert_eq!(records[1].uid, url_uid("https://n.com/other"));
        assert_ne!(records[0].uid, records[1].uid);
        assert_eq!(records[1].n_tokens_title, 0);
        assert_eq!(records[1].n_tokens_body, 2);
    }

    #[test]
    fn test_uid_is_deterministic_hex() {
        let a = url_uid("https://n.com/a");
        assert_eq!(a, url_uid("https://n.com/a"));
        assert_ne!(a, url_uid("https://n.com/b"));
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            url_uid(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_url_host() {
        assert_eq!(url_host("https://n.com/a/b"), "n.com");
        assert_eq!(url_host("http://n.com:8080/a"), "n.com:8080");
        assert_eq!(url_host("https://ñandú.com/x"), "ñandú.com");
        assert_eq!(url_host("https://User@N.com:443/x"), "User@N.com:443");
        assert_eq!(url_host("https://n.com?q=1"), "n.com");
        assert_eq!(url_host("https:///path"), "");
        assert_eq!(url_host("not a url"), "");
        assert_eq!(url_host("/relative/path"), "");
    }

    #[test]
    fn test_title_from_url() {
        assert_eq!(
            title_from_url("https://n.com/2024/ley-de-presupuesto").as_deref(),
            Some("ley de presupuesto")
        );
        assert_eq!(title_from_url("https://n.com/section/"), None);
    }

    #[test]
    fn test_flatten_line_breaks_keeps_length() {
        let body = "uno\r\ndos\ntres\rcuatro";
        let flat = flatten_line_breaks(body);
        assert_eq!(flat, "uno  dos tres cuatro");
        assert_eq!(flat.chars().count(), body.chars().count());
        assert!(!flat.contains('\n') && !flat.contains('\r'));
    }

    #[test]
    fn test_first_title_wins() {
        let batch = vec![
            raw("https://n.com/1", Some("Igual"), Some("primero")),
            raw("https://n.com/2", Some("Distinto"), Some("segundo")),
            raw("https://n.com/3", Some("Igual"), Some("tercero")),
        ];
        let records = pipeline().clean(batch, "n");
        let urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://n.com/1", "https://n.com/2"]);
    }

    #[test]
    fn test_backfilled_title_participates_in_dedup() {
        let batch = vec![
            raw("https://n.com/gran-noticia", Some("gran noticia"), Some("a")),
            raw("https://m.com/gran-noticia", None, Some("b")),
        ];
        let records = pipeline().clean(batch, "n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].host, "n.com");
    }

    #[test]
    fn test_repeated_url_keeps_first_uid() {
        let batch = vec![
            raw("https://n.com/a", Some("Uno"), Some("texto")),
            raw("https://n.com/a", Some("Dos"), Some("texto")),
        ];
        let records = pipeline().clean(batch, "n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Uno");
    }

    #[test]
    fn test_incomplete_copy_does_not_hide_complete_url() {
        let batch = vec![
            raw("https://n.com/a", Some("T"), None),
            raw("https://n.com/a", Some("U"), Some("cuerpo")),
        ];
        let records = pipeline().clean(batch, "n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "U");
        assert_eq!(records[0].uid, url_uid("https://n.com/a"));
    }

    #[test]
    fn test_title_dedup_runs_before_completeness_filter() {
        let batch = vec![
            raw("https://n.com/1", Some("T"), None),
            raw("https://n.com/2", Some("T"), Some("texto")),
        ];
        assert!(pipeline().clean(batch, "n").is_empty());
    }

    #[test]
    fn test_empty_authority_row_is_dropped() {
        let batch = vec![raw("https:///path", Some("Sin host"), Some("texto"))];
        assert!(pipeline().clean(batch, "n").is_empty());
    }

    #[test]
    fn test_incomplete_rows_are_dropped() {
        let batch = vec![
            raw("https://n.com/section/", None, Some("sin titulo")),
            raw("https://n.com/sin-cuerpo", Some("Sin cuerpo"), None),
            raw("https://n.com/vacio", Some("Vacio"), Some("")),
            raw("relative/path", Some("Sin host"), Some("texto")),
            raw("https://n.com/ok", Some("Completo"), Some("texto")),
        ];
        let records = pipeline().clean(batch, "n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Completo");
    }

    #[test]
    fn test_empty_batch_is_ok() {
        assert!(pipeline().clean(Vec::new(), "n").is_empty());
    }

    #[test]
    fn test_output_invariants_hold() {
        let batch = vec![
            raw("https://n.com/a-b", None, Some("x\ny")),
            raw("https://n.com/c", Some("C"), Some("z\r")),
            raw("https://n.com/d", Some("C"), Some("w")),
            raw("https://n.com/e/", None, Some("v")),
        ];
        let records = pipeline().clean(batch, "n");
        let titles: HashSet<&str> = records.iter().map(|r| r.title.as_str()).collect();
        let uids: HashSet<&str> = records.iter().map(|r| r.uid.as_str()).collect();
        assert_eq!(titles.len(), records.len());
        assert_eq!(uids.len(), records.len());
        for r in &records {
            assert!(!r.title.is_empty());
            assert!(!r.body.is_empty());
            assert!(!r.host.is_empty());
            assert!(!r.body.contains('\n') && !r.body.contains('\r'));
        }
    }
}
