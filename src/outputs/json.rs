//! JSON article store.
//!
//! Canonical records are kept in a single JSON object keyed by `uid`:
//!
//! ```text
//! {
//!   "6b86b273ff34fce1...": { "uid": "6b86b273ff34fce1...", "title": "...", ... },
//!   ...
//! }
//! ```
//!
//! A load merges into whatever the store already holds: a record whose `uid`
//! is already present replaces the stored one. The file is rewritten once per
//! run, not once per record.

use crate::error::SinkError;
use crate::models::CanonicalRecord;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// What one load did to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub inserted: usize,
    pub replaced: usize,
    pub total: usize,
}

/// File-backed store of canonical records.
#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents of the store; empty when the file does not exist yet.
    pub async fn read_all(&self) -> Result<BTreeMap<String, CanonicalRecord>, SinkError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    /// Merge `records` into the store and write it back.
    ///
    /// Records are applied in order, so a later record with the same `uid`
    /// wins. Missing parent directories are created.
    ///
    /// # Returns
    ///
    /// A [`LoadSummary`] with inserted, replaced and total counts.
    ///
    /// # Errors
    ///
    /// Fails when the existing store cannot be read or parsed, or when the
    /// updated store cannot be written.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), rows = records.len()))]
    pub async fn write_records(&self, records: &[CanonicalRecord]) -> Result<LoadSummary, SinkError> {
        let mut store = self.read_all().await?;
        let mut summary = LoadSummary::default();

        for record in records {
            info!(uid = %record.uid, "Loading article");
            if store.insert(record.uid.clone(), record.clone()).is_some() {
                summary.replaced += 1;
            } else {
                summary.inserted += 1;
            }
        }
        summary.total = store.len();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(parent).await {
                error!(dir = %parent.display(), error = %e, "Failed to create store dir");
                return Err(self.io_error(e));
            }
        }

        let json = serde_json::to_string_pretty(&store)?;
        fs::write(&self.path, json)
            .await
            .map_err(|e| self.io_error(e))?;
        info!(
            inserted = summary.inserted,
            replaced = summary.replaced,
            total = summary.total,
            "Wrote article store"
        );
        Ok(summary)
    }

    fn io_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}
