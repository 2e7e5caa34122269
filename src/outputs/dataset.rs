//! Delimited (CSV) dataset files for raw and cleaned articles.
//!
//! Both files are written and read in a single-byte legacy encoding (the
//! configured label, windows-1252 by default). Column order always comes from
//! [`RAW_COLUMNS`] / [`CANONICAL_COLUMNS`].
//!
//! Writing is lossy for text the encoding cannot represent: each such
//! character is stored as an HTML numeric character reference and reads back
//! in that form, so `"dos 中"` becomes `"dos &#20013;"`. A warning is logged
//! whenever this happens.
//!
//! ```text
//! out_dir/
//! ├── eluniversal_2025_05_06_articles.csv        # scrape
//! └── clean_eluniversal_2025_05_06_articles.csv  # clean
//! ```

use crate::error::DatasetError;
use crate::models::{CANONICAL_COLUMNS, CanonicalRecord, RAW_COLUMNS, RawArticle, SCHEMA_VERSION};
use chrono::NaiveDate;
use csv::StringRecord;
use encoding_rs::Encoding;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Prefix marking a cleaned dataset file.
pub const CLEAN_PREFIX: &str = "clean_";

/// Resolve an encoding label such as `iso-8859-1` or `windows-1252`.
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding, DatasetError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| DatasetError::UnknownEncoding(label.to_string()))
}

/// `{site_uid}_{YYYY_MM_DD}_articles.csv`
pub fn raw_file_name(site_uid: &str, run_date: NaiveDate) -> String {
    format!("{}_{}_articles.csv", site_uid, run_date.format("%Y_%m_%d"))
}

/// Path of the cleaned file derived from a raw file: same directory, prefixed name.
pub fn clean_file_path(raw_path: &Path) -> PathBuf {
    let name = raw_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    raw_path.with_file_name(format!("{CLEAN_PREFIX}{name}"))
}

/// The newspaper uid a raw file belongs to: its file name up to the first `_`.
pub fn newspaper_uid_from_path(path: &Path) -> Result<String, DatasetError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.split('_').next() {
        Some(uid) if !uid.is_empty() => Ok(uid.to_string()),
        _ => Err(DatasetError::InvalidFileName(path.display().to_string())),
    }
}

/// Write scraped articles. An empty batch still produces a header row.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = articles.len()))]
pub fn write_raw(
    path: &Path,
    articles: &[RawArticle],
    encoding: &'static Encoding,
) -> Result<(), DatasetError> {
    write_table(
        path,
        &RAW_COLUMNS,
        articles.iter().map(|a| a.to_row()),
        encoding,
    )
}

/// Read a scraped dataset.
///
/// Empty cells become absent values and unknown columns are ignored. Bytes
/// that are malformed for `encoding` are replaced and logged.
///
/// # Arguments
///
/// * `path` - Raw dataset file written by [`write_raw`]
/// * `encoding` - Encoding the file was written in
///
/// # Returns
///
/// One [`RawArticle`] per data row, in file order.
///
/// # Errors
///
/// Returns [`DatasetError::MissingColumn`] when the header lacks `url`,
/// `title` or `body`, and an I/O or CSV error when the file cannot be read.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn read_raw(path: &Path, encoding: &'static Encoding) -> Result<Vec<RawArticle>, DatasetError> {
    let (headers, records) = read_table(path, encoding)?;
    let [body, title, url] = column_indexes(&headers, RAW_COLUMNS)?;

    let articles: Vec<RawArticle> = records
        .iter()
        .map(|record| RawArticle {
            url: cell(record, url).unwrap_or_default(),
            title: cell(record, title),
            body: cell(record, body),
        })
        .collect();
    info!(rows = articles.len(), "Read raw dataset");
    Ok(articles)
}

/// Write cleaned records with `uid` as the leading column.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = records.len()))]
pub fn write_canonical(
    path: &Path,
    records: &[CanonicalRecord],
    encoding: &'static Encoding,
) -> Result<(), DatasetError> {
    write_table(
        path,
        &CANONICAL_COLUMNS,
        records.iter().map(|r| r.to_row()),
        encoding,
    )
}

/// Read a cleaned dataset back into records.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn read_canonical(
    path: &Path,
    encoding: &'static Encoding,
) -> Result<Vec<CanonicalRecord>, DatasetError> {
    let (headers, records) = read_table(path, encoding)?;
    let [uid, body, title, url, newspaper_uid, host, n_title, n_body] =
        column_indexes(&headers, CANONICAL_COLUMNS)?;

    records
        .iter()
        .enumerate()
        .map(|(row, record)| -> Result<CanonicalRecord, DatasetError> {
            Ok(CanonicalRecord {
                uid: cell(record, uid).unwrap_or_default(),
                url: cell(record, url).unwrap_or_default(),
                title: cell(record, title).unwrap_or_default(),
                body: cell(record, body).unwrap_or_default(),
                host: cell(record, host).unwrap_or_default(),
                newspaper_uid: cell(record, newspaper_uid).unwrap_or_default(),
                n_tokens_title: count(record, n_title, row, "n_tokens_title")?,
                n_tokens_body: count(record, n_body, row, "n_tokens_body")?,
            })
        })
        .collect()
}

fn io_error(path: &Path, source: std::io::Error) -> DatasetError {
    DatasetError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn write_table<R, I>(
    path: &Path,
    header: &[&str],
    rows: I,
    encoding: &'static Encoding,
) -> Result<(), DatasetError>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| io_error(path, e.into_error()))?;

    let text = String::from_utf8_lossy(&bytes);
    let (encoded, _, had_unmappable) = encoding.encode(&text);
    if had_unmappable {
        warn!(
            path = %path.display(),
            encoding = encoding.name(),
            "Some characters are not representable and were written as numeric references"
        );
    }
    std::fs::write(path, &encoded).map_err(|e| io_error(path, e))?;
    info!(path = %path.display(), schema_version = SCHEMA_VERSION, "Wrote dataset");
    Ok(())
}

fn read_table(
    path: &Path,
    encoding: &'static Encoding,
) -> Result<(StringRecord, Vec<StringRecord>), DatasetError> {
    let bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;
    let (text, had_errors) = encoding.decode_without_bom_handling(&bytes);
    if had_errors {
        warn!(path = %path.display(), encoding = encoding.name(), "Malformed input bytes replaced");
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();
    let records = reader.records().collect::<Result<Vec<_>, _>>()?;
    Ok((headers, records))
}

/// Positions of `wanted` columns in `headers`, in the order given.
fn column_indexes<const N: usize>(
    headers: &StringRecord,
    wanted: [&'static str; N],
) -> Result<[usize; N], DatasetError> {
    let mut indexes = [0usize; N];
    for (slot, name) in indexes.iter_mut().zip(wanted) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(DatasetError::MissingColumn(name))?;
    }
    Ok(indexes)
}

fn cell(record: &StringRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn count(
    record: &StringRecord,
    index: usize,
    row: usize,
    column: &'static str,
) -> Result<u64, DatasetError> {
    let value = record.get(index).unwrap_or("");
    value.trim().parse().map_err(|_| DatasetError::InvalidCount {
        row,
        column,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_ENCODING;

    fn latin1() -> &'static Encoding {
        encoding_for_label(DEFAULT_ENCODING).unwrap()
    }

    #[test]
    fn test_file_names() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();
        assert_eq!(raw_file_name("eluniversal", date), "eluniversal_2025_05_06_articles.csv");
        assert_eq!(
            clean_file_path(Path::new("out/eluniversal_2025_05_06_articles.csv")),
            PathBuf::from("out/clean_eluniversal_2025_05_06_articles.csv")
        );
        assert_eq!(
            newspaper_uid_from_path(Path::new("out/eluniversal_2025_05_06_articles.csv")).unwrap(),
            "eluniversal"
        );
        assert!(newspaper_uid_from_path(Path::new("out/_x.csv")).is_err());
    }

    #[test]
    fn test_iso_8859_1_label_is_accepted() {
        assert_eq!(encoding_for_label("ISO-8859-1").unwrap(), latin1());
        assert!(matches!(
            encoding_for_label("klingon"),
            Err(DatasetError::UnknownEncoding(_))
        ));
    }

    #[test]
    fn test_unrepresentable_text_reads_back_as_references() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("n_2025_05_06_articles.csv");
        let articles = vec![RawArticle {
            url: "https://n.com/a".to_string(),
            title: Some("Título".to_string()),
            body: Some("dos 中 ✓".to_string()),
        }];
        write_raw(&path, &articles, latin1()).unwrap();

        let back = read_raw(&path, latin1()).unwrap();
        assert_eq!(back[0].title.as_deref(), Some("Título"));
        assert_eq!(back[0].body.as_deref(), Some("dos &#20013; &#10003;"));
    }

    #[test]
    fn test_raw_file_uses_single_byte_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("n_2025_05_06_articles.csv");
        let articles = vec![
            RawArticle {
                url: "https://n.com/año-nuevo".to_string(),
                title: None,
                body: Some("Línea uno\nLínea, \"dos\"".to_string()),
            },
            RawArticle {
                url: "https://n.com/b".to_string(),
                title: Some("Título".to_string()),
                body: None,
            },
        ];
        write_raw(&path, &articles, latin1()).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"body,title,url\n"));
        // 'í' is a single 0xED byte in windows-1252.
        assert!(bytes.contains(&0xED));

        assert_eq!(read_raw(&path, latin1()).unwrap(), articles);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("n_articles.csv");
        std::fs::write(&path, "body,url\nTexto,https://n.com/a\n").unwrap();
        assert!(matches!(
            read_raw(&path, latin1()),
            Err(DatasetError::MissingColumn("title"))
        ));
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("n_articles.csv");
        std::fs::write(&path, "author,url,title,body\nAna,https://n.com/a,,Texto\n").unwrap();
        let articles = read_raw(&path, latin1()).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, None);
        assert_eq!(articles[0].body.as_deref(), Some("Texto"));
    }

    #[test]
    fn test_empty_batch_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clean_n_articles.csv");
        write_canonical(&path, &[], latin1()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "uid,body,title,url,newspaper_uid,host,n_tokens_title,n_tokens_body\n"
        );
        assert!(read_canonical(&path, latin1()).unwrap().is_empty());
    }

    #[test]
    fn test_canonical_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clean_n_articles.csv");
        let record = CanonicalRecord {
            uid: "abc".to_string(),
            url: "https://n.com/a".to_string(),
            title: "Título".to_string(),
            body: "Cuerpo".to_string(),
            host: "n.com".to_string(),
            newspaper_uid: "n".to_string(),
            n_tokens_title: 1,
            n_tokens_body: 1,
        };
        write_canonical(&path, std::slice::from_ref(&record), latin1()).unwrap();
        assert_eq!(read_canonical(&path, latin1()).unwrap(), vec![record]);
    }

    #[test]
    fn test_bad_count_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clean_n_articles.csv");
        std::fs::write(
            &path,
            "uid,body,title,url,newspaper_uid,host,n_tokens_title,n_tokens_body\n\
             a,b,t,https://n.com/a,n,n.com,x,1\n",
        )
        .unwrap();
        assert!(matches!(
            read_canonical(&path, latin1()),
            Err(DatasetError::InvalidCount { row: 0, column: "n_tokens_title", .. })
        ));
    }
}
