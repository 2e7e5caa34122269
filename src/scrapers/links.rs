//! Turning homepage `href` values into fetchable URLs.

use once_cell::sync::Lazy;
use regex::Regex;

static WELL_FORMED_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://.+/.+$").unwrap());
static ROOT_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/.+$").unwrap());

/// Resolve `link` against `base_host` (e.g. `https://example.com`).
///
/// Absolute links pass through, root-relative paths are appended to the host
/// and anything else is joined with a `/`. The result is only syntactically
/// joined; whether it points anywhere is decided by fetching it.
pub fn resolve(base_host: &str, link: &str) -> String {
    if WELL_FORMED_LINK.is_match(link) {
        link.to_string()
    } else if ROOT_PATH.is_match(link) {
        format!("{base_host}{link}")
    } else {
        format!("{base_host}/{link}")
    }
}
