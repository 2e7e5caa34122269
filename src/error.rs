//! Error types for the harvesting and cleaning stages.
//!
//! Each module seam has its own error enum so the binary can decide which
//! failures are fatal for a run. Per-article failures never show up here: they
//! are expressed as [`crate::scrapers::article::FetchOutcome`] variants instead.

use thiserror::Error;

/// Problems loading or querying the YAML configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("unknown news site `{uid}` (configured: {known})")]
    UnknownSite { uid: String, known: String },
    #[error("invalid CSS selector `{selector}` for {field}")]
    Selector { field: &'static str, selector: String },
}

/// Failure of a single page request at the transport layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// DNS, connect, timeout, body read or retry exhaustion.
    #[error("network error: {0}")]
    Network(String),
    /// The server answered with a 4xx/5xx status.
    #[error("HTTP status {0}")]
    Status(u16),
}

/// The homepage itself could not be fetched; the scrape run for that site stops.
#[derive(Debug, Error)]
#[error("failed to fetch homepage {url}: {source}")]
pub struct HomepageError {
    pub url: String,
    #[source]
    pub source: TransportError,
}

/// Reading or writing a tabular dataset file.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("unknown text encoding `{0}`")]
    UnknownEncoding(String),
    #[error("required column `{0}` is missing from the input header")]
    MissingColumn(&'static str),
    #[error("row {row}: column `{column}` is not a valid count: `{value}`")]
    InvalidCount {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("cannot derive a newspaper uid from file name `{0}`")]
    InvalidFileName(String),
}

/// Writing canonical records to the store.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
